//! Key cache: key identifier to (signing key, expiry instant).
//!
//! Entries are inserted by the resolver after a successful fetch and are
//! served until their expiry passes. Nothing refreshes them in the background;
//! a lookup past expiry is simply a miss and the next insert overwrites the
//! stale entry.

use crate::auth::keys::SigningKey;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default cache TTL in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

struct CacheEntry {
    key: SigningKey,
    expires_at: Instant,
}

/// Concurrent key cache shared by all requests.
pub struct KeyCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl KeyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry for `kid`.
    pub async fn get(&self, kid: &str) -> Option<SigningKey> {
        self.get_at(kid, Instant::now()).await
    }

    /// Look up a live entry for `kid` as of `now`.
    pub async fn get_at(&self, kid: &str, now: Instant) -> Option<SigningKey> {
        let entries = self.entries.read().await;
        entries
            .get(kid)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.key.clone())
    }

    /// Cache `key` under its own identifier.
    pub async fn insert(&self, key: SigningKey) {
        self.insert_at(key, Instant::now()).await;
    }

    /// Cache `key` under its own identifier, expiring `ttl` after `now`.
    pub async fn insert_at(&self, key: SigningKey, now: Instant) {
        let Some(expires_at) = now.checked_add(self.ttl) else {
            tracing::warn!(
                target: "gate.auth.cache",
                kid = %key.key_id(),
                "Cache TTL overflows the clock, key not cached"
            );
            return;
        };

        let mut entries = self.entries.write().await;
        entries.insert(key.key_id().to_string(), CacheEntry { key, expires_at });
    }

    /// Whether any entry (live or expired) exists for `kid`.
    pub async fn contains(&self, kid: &str) -> bool {
        self.entries.read().await.contains_key(kid)
    }

    /// Number of entries, live or expired.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS))
    }
}
