//! The authentication gate.
//!
//! Orchestrates decode, key resolution, signature verification and claims
//! validation for one request and produces an allow/deny decision. The gate
//! is built once at startup and shared by all requests.
//!
//! # Security
//!
//! - A disabled gate allows everything without looking at the request
//! - An enabled gate without issuer or JWKS URL denies everything
//! - Every failure is a denial; the cause is logged but never returned to
//!   the caller (see `crate::errors::GateError`)

use crate::auth::cache::KeyCache;
use crate::auth::claims::{ClaimsValidator, VerifiedIdentity};
use crate::auth::decoder::decode_token;
use crate::auth::error::AuthError;
use crate::auth::jwks::HttpKeySetFetcher;
use crate::auth::resolver::KeyResolver;
use crate::config::AuthConfig;
use crate::observability::metrics;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Let the request through. Carries the identity when a token was verified;
    /// `None` when the gate is disabled.
    Allow(Option<VerifiedIdentity>),

    /// Reject the request. The cause is for server-side use only.
    Deny(AuthError),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow(_))
    }

    pub fn identity(&self) -> Option<&VerifiedIdentity> {
        match self {
            GateDecision::Allow(identity) => identity.as_ref(),
            GateDecision::Deny(_) => None,
        }
    }
}

enum GateMode {
    Disabled,
    Misconfigured,
    Enforcing {
        resolver: KeyResolver,
        validator: ClaimsValidator,
    },
}

/// Bearer-token authentication gate.
pub struct Gate {
    mode: GateMode,
}

impl Gate {
    /// An enforcing gate over the given resolver and validator.
    pub fn new(resolver: KeyResolver, validator: ClaimsValidator) -> Self {
        Self {
            mode: GateMode::Enforcing {
                resolver,
                validator,
            },
        }
    }

    /// A gate that allows every request.
    pub fn disabled() -> Self {
        Self {
            mode: GateMode::Disabled,
        }
    }

    /// A gate that denies every request.
    pub fn misconfigured() -> Self {
        Self {
            mode: GateMode::Misconfigured,
        }
    }

    /// Build the gate from configuration.
    ///
    /// Enabled without an issuer or JWKS URL yields a gate that denies
    /// everything rather than an error, so the service still starts.
    pub fn from_config(config: &AuthConfig) -> Self {
        if !config.enabled {
            tracing::warn!(target: "gate.auth.gate", "JWT authentication is disabled, all requests are allowed");
            return Self::disabled();
        }

        let (Some(issuer), Some(jwks_url)) = (&config.issuer, &config.jwks_url) else {
            tracing::error!(
                target: "gate.auth.gate",
                issuer_set = config.issuer.is_some(),
                jwks_url_set = config.jwks_url.is_some(),
                "JWT authentication enabled but not configured, all requests are denied"
            );
            return Self::misconfigured();
        };

        let fetcher = Arc::new(HttpKeySetFetcher::with_timeout(
            jwks_url.clone(),
            config.fetch_timeout,
        ));
        let cache = Arc::new(KeyCache::new(config.cache_ttl));
        let validator = ClaimsValidator::new(issuer.clone(), config.audience.clone());

        tracing::info!(
            target: "gate.auth.gate",
            jwks_url = %jwks_url,
            issuer = %issuer,
            audience = ?config.audience,
            cache_ttl_ms = config.cache_ttl.as_millis(),
            "JWT authentication enabled"
        );

        Self::new(KeyResolver::new(cache, fetcher), validator)
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.mode, GateMode::Disabled)
    }

    /// The key cache, when enforcing.
    pub fn cache(&self) -> Option<&Arc<KeyCache>> {
        match &self.mode {
            GateMode::Enforcing { resolver, .. } => Some(resolver.cache()),
            _ => None,
        }
    }

    /// Decide on a request given its headers.
    #[instrument(skip_all, name = "gate.auth.authenticate")]
    pub async fn authenticate(&self, headers: &HeaderMap) -> GateDecision {
        // Disabled short-circuits before the headers are even read
        if matches!(self.mode, GateMode::Disabled) {
            metrics::record_auth_decision("allow", "disabled", std::time::Duration::ZERO);
            return GateDecision::Allow(None);
        }

        self.authenticate_header(first_authorization_value(headers))
            .await
    }

    /// Decide on a single `Authorization` header value (or its absence).
    pub async fn authenticate_header(&self, value: Option<&str>) -> GateDecision {
        let start = Instant::now();

        let result = match &self.mode {
            GateMode::Disabled => {
                metrics::record_auth_decision("allow", "disabled", start.elapsed());
                return GateDecision::Allow(None);
            }
            GateMode::Misconfigured => Err(AuthError::MisconfiguredGate),
            GateMode::Enforcing { .. } => match value.and_then(bearer_token) {
                Some(token) => self.authenticate_token(token).await,
                None => Err(AuthError::MissingBearerToken),
            },
        };

        match result {
            Ok(identity) => {
                tracing::debug!(target: "gate.auth.gate", "Request authenticated");
                metrics::record_auth_decision("allow", "verified", start.elapsed());
                GateDecision::Allow(Some(identity))
            }
            Err(e) => {
                tracing::debug!(target: "gate.auth.gate", reason = e.reason(), "Request denied");
                metrics::record_auth_decision("deny", e.reason(), start.elapsed());
                GateDecision::Deny(e)
            }
        }
    }

    /// Run the full pipeline on a bare token.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's `AuthError`. A disabled gate
    /// verifies nothing and returns `MisconfiguredGate` here; use
    /// [`Gate::authenticate`] for request decisions.
    pub async fn authenticate_token(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let GateMode::Enforcing {
            resolver,
            validator,
        } = &self.mode
        else {
            return Err(AuthError::MisconfiguredGate);
        };

        let decoded = decode_token(token)?;
        let key = resolver.resolve(decoded.key_id()).await?;
        let claims = decoded.verify(&key)?;
        validator.validate(claims)
    }

    /// Whether the key source can currently be fetched. Leaves the cache alone.
    ///
    /// # Errors
    ///
    /// - `MisconfiguredGate` if enabled without issuer/JWKS URL
    /// - `KeySourceUnavailable` if the fetch fails
    pub async fn check_key_source(&self) -> Result<(), AuthError> {
        match &self.mode {
            GateMode::Disabled => Ok(()),
            GateMode::Misconfigured => Err(AuthError::MisconfiguredGate),
            GateMode::Enforcing { resolver, .. } => resolver.fetcher().fetch().await.map(|_| ()),
        }
    }
}

/// Extract the bearer token from request headers.
///
/// Uses the first `Authorization` value that is visible ASCII and non-empty
/// after trimming. Accepts a raw token or one prefixed with `Bearer `
/// (case-sensitive).
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    first_authorization_value(headers).and_then(bearer_token)
}

fn first_authorization_value(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(AUTHORIZATION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| !value.trim().is_empty())
}

/// Normalize one header value into a token.
pub(crate) fn bearer_token(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let token = match trimmed.strip_prefix(BEARER_PREFIX) {
        Some(rest) => rest.trim(),
        None => trimmed,
    };
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::Duration;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    fn auth_config(issuer: Option<&str>, jwks_url: Option<&str>) -> AuthConfig {
        AuthConfig {
            enabled: true,
            issuer: issuer.map(ToString::to_string),
            audience: None,
            jwks_url: jwks_url.map(ToString::to_string),
            cache_ttl: Duration::from_secs(300),
            fetch_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&headers(&["Bearer abc.def.ghi"])), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers(&["  Bearer   abc  "])), Some("abc"));
        assert_eq!(extract_bearer_token(&headers(&["abc.def.ghi"])), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers(&["Bearer "])), Some("Bearer"));
        assert_eq!(extract_bearer_token(&headers(&["Bearer    x"])), Some("x"));
        assert_eq!(extract_bearer_token(&headers(&[])), None);
        assert_eq!(extract_bearer_token(&headers(&["   "])), None);
    }

    #[test]
    fn test_bearer_prefix_is_case_sensitive() {
        // Lowercase prefix is not stripped, so the whole value is the token
        assert_eq!(extract_bearer_token(&headers(&["bearer abc"])), Some("bearer abc"));
    }

    #[test]
    fn test_first_non_empty_header_wins() {
        assert_eq!(
            extract_bearer_token(&headers(&["", "Bearer first", "Bearer second"])),
            Some("first")
        );
    }

    #[test]
    fn test_non_ascii_header_is_skipped() {
        let mut headers = HeaderMap::new();
        headers.append(AUTHORIZATION, HeaderValue::from_bytes(b"Bearer \xff").unwrap());
        headers.append(AUTHORIZATION, HeaderValue::from_static("Bearer ok"));

        assert_eq!(extract_bearer_token(&headers), Some("ok"));
    }

    #[tokio::test]
    async fn test_disabled_gate_allows_without_header() {
        let gate = Gate::disabled();

        assert!(!gate.is_enabled());
        assert_eq!(gate.authenticate(&HeaderMap::new()).await, GateDecision::Allow(None));
        assert_eq!(
            gate.authenticate(&headers(&["Bearer garbage"])).await,
            GateDecision::Allow(None)
        );
    }

    #[tokio::test]
    async fn test_from_config_disabled() {
        let mut config = auth_config(None, None);
        config.enabled = false;

        let gate = Gate::from_config(&config);
        assert!(!gate.is_enabled());
        assert!(gate.authenticate(&HeaderMap::new()).await.is_allowed());
    }

    #[tokio::test]
    async fn test_misconfigured_gate_denies_everything() {
        for config in [
            auth_config(None, Some("http://127.0.0.1:9/jwks")),
            auth_config(Some("https://issuer.example"), None),
            auth_config(None, None),
        ] {
            let gate = Gate::from_config(&config);

            assert!(gate.is_enabled());
            assert!(gate.cache().is_none());
            assert_eq!(
                gate.authenticate(&headers(&["Bearer a.b.c"])).await,
                GateDecision::Deny(AuthError::MisconfiguredGate)
            );
            assert_eq!(
                gate.check_key_source().await,
                Err(AuthError::MisconfiguredGate)
            );
        }
    }

    #[tokio::test]
    async fn test_missing_token_denied() {
        let gate = Gate::from_config(&auth_config(
            Some("https://issuer.example"),
            Some("http://127.0.0.1:9/jwks"),
        ));

        assert_eq!(
            gate.authenticate(&HeaderMap::new()).await,
            GateDecision::Deny(AuthError::MissingBearerToken)
        );
        assert_eq!(
            gate.authenticate_header(Some("Bearer    ")).await,
            GateDecision::Deny(AuthError::MalformedToken)
        );
    }

    #[tokio::test]
    async fn test_malformed_token_denied_before_fetch() {
        let gate = Gate::from_config(&auth_config(
            Some("https://issuer.example"),
            Some("http://127.0.0.1:9/jwks"),
        ));

        let decision = gate.authenticate(&headers(&["Bearer not-a-jwt"])).await;

        assert_eq!(decision, GateDecision::Deny(AuthError::MalformedToken));
        assert!(decision.identity().is_none());
        assert!(gate.cache().unwrap().is_empty().await);
    }
}
