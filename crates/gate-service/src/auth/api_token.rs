//! Static API-token gate.
//!
//! A shared-secret guard independent of the JWT gate. The expected token is
//! held only as an HMAC tag under a per-process random key, and presented
//! tokens are checked with `ring::hmac::verify`, which compares in constant
//! time.

use crate::auth::error::AuthError;
use crate::config::ApiTokenConfig;
use crate::observability::metrics;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use common::secret::{ExposeSecret, SecretString};
use ring::hmac;
use ring::rand::SystemRandom;
use std::time::Instant;

const BEARER_PREFIX: &str = "Bearer ";

enum ApiTokenMode {
    Disabled,
    Misconfigured,
    Enforcing { key: hmac::Key, expected: hmac::Tag },
}

/// Guard comparing the `Authorization` header against a configured token.
pub struct ApiTokenGate {
    mode: ApiTokenMode,
}

impl ApiTokenGate {
    /// A gate that allows every request.
    pub fn disabled() -> Self {
        Self {
            mode: ApiTokenMode::Disabled,
        }
    }

    /// An enforcing gate for `token`.
    ///
    /// Falls back to denying everything if no random key can be generated.
    pub fn new(token: &SecretString) -> Self {
        let rng = SystemRandom::new();
        let Ok(key) = hmac::Key::generate(hmac::HMAC_SHA256, &rng) else {
            tracing::error!(target: "gate.auth.api_token", "Failed to generate HMAC key, all requests are denied");
            return Self {
                mode: ApiTokenMode::Misconfigured,
            };
        };
        let expected = hmac::sign(&key, token.expose_secret().as_bytes());

        Self {
            mode: ApiTokenMode::Enforcing { key, expected },
        }
    }

    /// Build the gate from configuration. Enabled without a token denies
    /// everything.
    pub fn from_config(config: &ApiTokenConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        match &config.token {
            Some(token) => {
                tracing::info!(target: "gate.auth.api_token", "API token authentication enabled");
                Self::new(token)
            }
            None => {
                tracing::error!(
                    target: "gate.auth.api_token",
                    "API token authentication enabled but API_TOKEN is not set, all requests are denied"
                );
                Self {
                    mode: ApiTokenMode::Misconfigured,
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.mode, ApiTokenMode::Disabled)
    }

    /// Check a request's headers.
    ///
    /// # Errors
    ///
    /// - `MisconfiguredGate` if enabled without a usable token
    /// - `MissingBearerToken` if no `Authorization` value is present
    /// - `InvalidApiToken` if the presented token does not match
    pub fn check(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let start = Instant::now();
        let result = self.evaluate(headers);

        match &result {
            Ok(()) => metrics::record_auth_decision("allow", "api_token", start.elapsed()),
            Err(e) => {
                tracing::debug!(target: "gate.auth.api_token", reason = e.reason(), "Request denied");
                metrics::record_auth_decision("deny", e.reason(), start.elapsed());
            }
        }
        result
    }

    fn evaluate(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let (key, expected) = match &self.mode {
            ApiTokenMode::Disabled => return Ok(()),
            ApiTokenMode::Misconfigured => return Err(AuthError::MisconfiguredGate),
            ApiTokenMode::Enforcing { key, expected } => (key, expected),
        };

        let value = headers
            .get_all(AUTHORIZATION)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| !value.is_empty())
            .ok_or(AuthError::MissingBearerToken)?;
        let token = value.strip_prefix(BEARER_PREFIX).unwrap_or(value);

        hmac::verify(key, token.as_bytes(), expected.as_ref())
            .map_err(|_| AuthError::InvalidApiToken)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config(enabled: bool, token: Option<&str>) -> ApiTokenConfig {
        ApiTokenConfig {
            enabled,
            token: token.map(|t| SecretString::from(t.to_string())),
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_disabled_allows_everything() {
        let gate = ApiTokenGate::from_config(&config(false, Some("s3cret")));

        assert!(!gate.is_enabled());
        assert!(gate.check(&HeaderMap::new()).is_ok());
        assert!(gate.check(&headers("wrong")).is_ok());
    }

    #[test]
    fn test_accepts_raw_and_bearer_token() {
        let gate = ApiTokenGate::from_config(&config(true, Some("s3cret")));

        assert!(gate.check(&headers("s3cret")).is_ok());
        assert!(gate.check(&headers("Bearer s3cret")).is_ok());
    }

    #[test]
    fn test_rejects_wrong_or_missing_token() {
        let gate = ApiTokenGate::from_config(&config(true, Some("s3cret")));

        assert_eq!(gate.check(&headers("s3cre")), Err(AuthError::InvalidApiToken));
        assert_eq!(gate.check(&headers("Bearer s3cretx")), Err(AuthError::InvalidApiToken));
        assert_eq!(gate.check(&headers("bearer s3cret")), Err(AuthError::InvalidApiToken));
        assert_eq!(gate.check(&HeaderMap::new()), Err(AuthError::MissingBearerToken));
    }

    #[test]
    fn test_enabled_without_token_fails_closed() {
        let gate = ApiTokenGate::from_config(&config(true, None));

        assert!(gate.is_enabled());
        assert_eq!(gate.check(&headers("anything")), Err(AuthError::MisconfiguredGate));
        assert_eq!(gate.check(&HeaderMap::new()), Err(AuthError::MisconfiguredGate));
    }
}
