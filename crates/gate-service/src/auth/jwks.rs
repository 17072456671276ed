//! Key set fetcher.
//!
//! Retrieves the issuer's JWKS (JSON Web Key Set) document from the configured
//! endpoint. The fetcher does no caching of its own; the resolver decides when
//! a fetch is needed and what to keep.
//!
//! # Security
//!
//! - Every fetch is bounded by a request timeout
//! - Non-2xx status, transport errors, timeouts and undecodable bodies all map
//!   to a single `KeySourceUnavailable` failure
//! - HTTPS should be used in production (enforced by deployment config)

use crate::auth::error::AuthError;
use crate::observability::metrics;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Default fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// JSON Web Key as published in the key set document.
///
/// Only `kty` is required. Members for other key types are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for keys the gate can use).
    pub kty: String,

    /// Key ID - matched against the token header `kid`.
    #[serde(default)]
    pub kid: Option<String>,

    /// Algorithm the key is intended for.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use ("sig" for signing keys).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,
}

/// The key set document: `{"keys": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksDocument {
    /// Published keys, possibly several during rotation.
    pub keys: Vec<Jwk>,
}

impl JwksDocument {
    /// Find the entry whose own `kid` equals `kid`.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }
}

/// Source of the current key set document.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// Fetch the full current document.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeySourceUnavailable` for any failure.
    async fn fetch(&self) -> Result<JwksDocument, AuthError>;
}

/// Fetches the key set document over HTTP.
pub struct HttpKeySetFetcher {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    /// Upper bound for one fetch, connection included.
    timeout: Duration,
}

impl HttpKeySetFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new(jwks_url: String) -> Self {
        Self::with_timeout(jwks_url, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS))
    }

    /// Create a fetcher with a custom timeout.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL of the issuer's JWKS endpoint
    /// * `timeout` - Upper bound for a single fetch
    pub fn with_timeout(jwks_url: String, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "gate.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            timeout,
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch_document(&self) -> Result<JwksDocument, AuthError> {
        tracing::debug!(target: "gate.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        // Per-request timeout as well, since the default client above has none
        let response = self
            .http_client
            .get(&self.jwks_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    target: "gate.auth.jwks",
                    error = %e,
                    timed_out = e.is_timeout(),
                    "Failed to fetch JWKS"
                );
                AuthError::KeySourceUnavailable
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "gate.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(AuthError::KeySourceUnavailable);
        }

        let document: JwksDocument = response.json().await.map_err(|e| {
            tracing::error!(target: "gate.auth.jwks", error = %e, "Failed to parse JWKS response");
            AuthError::KeySourceUnavailable
        })?;

        tracing::info!(
            target: "gate.auth.jwks",
            key_count = document.keys.len(),
            "JWKS fetched"
        );

        Ok(document)
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    #[instrument(skip_all, name = "gate.auth.jwks.fetch")]
    async fn fetch(&self) -> Result<JwksDocument, AuthError> {
        let start = Instant::now();
        let result = self.fetch_document().await;
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::record_jwks_fetch(status, start.elapsed());
        result
    }
}
