//! Key resolver: cache first, key set fetch on miss.
//!
//! Only the key matching the requested `kid` is cached after a fetch, under
//! that key's own identifier. A `kid` that is absent from the document leaves
//! no trace in the cache, and a failed fetch never falls back to stale keys.
//!
//! Concurrent misses, for the same `kid` or different ones, share whichever
//! key set fetch is in flight instead of queueing behind each other.

use crate::auth::cache::KeyCache;
use crate::auth::error::AuthError;
use crate::auth::jwks::{JwksDocument, KeySetFetcher};
use crate::auth::keys::SigningKey;
use crate::observability::metrics;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex};
use tracing::instrument;

/// A key set fetch that any number of misses can await together.
type InFlightFetch = Shared<BoxFuture<'static, Result<Arc<JwksDocument>, AuthError>>>;

pub struct KeyResolver {
    cache: Arc<KeyCache>,
    fetcher: Arc<dyn KeySetFetcher>,

    /// The fetch currently running, if any. Held only to swap the slot,
    /// never across an await.
    in_flight: Mutex<Option<InFlightFetch>>,
}

impl KeyResolver {
    pub fn new(cache: Arc<KeyCache>, fetcher: Arc<dyn KeySetFetcher>) -> Self {
        Self {
            cache,
            fetcher,
            in_flight: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &Arc<KeyCache> {
        &self.cache
    }

    pub fn fetcher(&self) -> &Arc<dyn KeySetFetcher> {
        &self.fetcher
    }

    /// Resolve `kid` to a signing key.
    ///
    /// A miss joins the fetch already in flight or starts one. Misses never
    /// wait on each other beyond that single round trip.
    ///
    /// # Errors
    ///
    /// - `KeySourceUnavailable` if the key set could not be fetched
    /// - `UnknownKey` if the fetched document has no key with this `kid`
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn resolve(&self, kid: &str) -> Result<SigningKey, AuthError> {
        if let Some(key) = self.cache.get(kid).await {
            tracing::debug!(target: "gate.auth.resolver", kid = %kid, "Key cache hit");
            metrics::record_key_cache_lookup("hit");
            return Ok(key);
        }
        metrics::record_key_cache_lookup("miss");

        let fetch = self.join_or_start_fetch();
        let result = fetch.clone().await;
        self.clear_fetch(&fetch);
        let document = result?;

        let Some(key) = document.find(kid).and_then(SigningKey::from_jwk) else {
            tracing::warn!(target: "gate.auth.resolver", kid = %kid, "Key not found in JWKS");
            return Err(AuthError::UnknownKey);
        };

        self.cache.insert(key.clone()).await;
        Ok(key)
    }

    fn join_or_start_fetch(&self) -> InFlightFetch {
        let mut slot = self
            .in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        // A finished fetch left behind by a cancelled request is never reused
        if let Some(fetch) = slot.as_ref().filter(|fetch| fetch.peek().is_none()) {
            tracing::debug!(target: "gate.auth.resolver", "Joining in-flight JWKS fetch");
            return fetch.clone();
        }

        let fetcher = Arc::clone(&self.fetcher);
        let fetch = async move { fetcher.fetch().await.map(Arc::new) }
            .boxed()
            .shared();
        *slot = Some(fetch.clone());
        fetch
    }

    fn clear_fetch(&self, finished: &InFlightFetch) {
        let mut slot = self
            .in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if slot.as_ref().is_some_and(|fetch| fetch.ptr_eq(finished)) {
            *slot = None;
        }
    }
}
