//! Claims validation and the verified identity.
//!
//! Runs only on [`SignedClaims`], i.e. after the signature has verified.
//! Checks are evaluated in a fixed order (`exp`, `nbf`, `iss`, `aud`) and
//! stop at the first failure.

use crate::auth::error::AuthError;
use crate::auth::verifier::SignedClaims;
use common::jwt::unix_now;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Checks time-bounded and identity claims.
#[derive(Debug, Clone)]
pub struct ClaimsValidator {
    issuer: String,
    audience: Option<String>,
}

impl ClaimsValidator {
    /// # Arguments
    ///
    /// * `issuer` - Exact `iss` value to accept
    /// * `audience` - Expected `aud`; `None` disables the audience check
    pub fn new(issuer: String, audience: Option<String>) -> Self {
        Self { issuer, audience }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    /// Validate against the current wall clock.
    ///
    /// # Errors
    ///
    /// See [`ClaimsValidator::validate_at`].
    pub fn validate(&self, claims: SignedClaims) -> Result<VerifiedIdentity, AuthError> {
        self.validate_at(claims, unix_now())
    }

    /// Validate as of `now` (seconds since the Unix epoch).
    ///
    /// # Errors
    ///
    /// - `Expired` - `exp` missing, non-numeric, or `<= now`
    /// - `NotYetValid` - `nbf` present and non-numeric or `> now`
    /// - `IssuerMismatch` - `iss` missing or not exactly the configured issuer
    /// - `AudienceMismatch` - audience configured and `aud` missing or not matching
    pub fn validate_at(
        &self,
        claims: SignedClaims,
        now: i64,
    ) -> Result<VerifiedIdentity, AuthError> {
        #[allow(clippy::cast_precision_loss)]
        let now = now as f64;

        let exp = claims.get("exp").and_then(Value::as_f64);
        if !exp.is_some_and(|exp| exp > now) {
            tracing::debug!(target: "gate.auth.claims", "Token expired or missing exp");
            return Err(AuthError::Expired);
        }

        if let Some(nbf) = claims.get("nbf") {
            if !nbf.as_f64().is_some_and(|nbf| nbf <= now) {
                tracing::debug!(target: "gate.auth.claims", "Token not yet valid");
                return Err(AuthError::NotYetValid);
            }
        }

        if claims.get("iss").and_then(Value::as_str) != Some(self.issuer.as_str()) {
            tracing::debug!(target: "gate.auth.claims", "Token issuer mismatch");
            return Err(AuthError::IssuerMismatch);
        }

        if let Some(expected) = &self.audience {
            if !audience_matches(claims.get("aud"), expected) {
                tracing::debug!(target: "gate.auth.claims", "Token audience mismatch");
                return Err(AuthError::AudienceMismatch);
            }
        }

        Ok(VerifiedIdentity(claims.into_inner()))
    }
}

/// `aud` may be a single string or an array of strings.
fn audience_matches(aud: Option<&Value>, expected: &str) -> bool {
    match aud {
        Some(Value::String(aud)) => aud == expected,
        Some(Value::Array(values)) => values
            .iter()
            .any(|value| value.as_str() == Some(expected)),
        _ => false,
    }
}

/// The validated claim set, attached to the request for downstream handlers.
///
/// Serializes as the plain claims object. The `sub` claim is redacted in
/// Debug output.
#[derive(Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VerifiedIdentity(Map<String, Value>);

impl VerifiedIdentity {
    pub fn issuer(&self) -> Option<&str> {
        self.0.get("iss").and_then(Value::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// Raw `aud` claim, string or array.
    pub fn audience(&self) -> Option<&Value> {
        self.0.get("aud")
    }

    pub fn expires_at(&self) -> Option<f64> {
        self.0.get("exp").and_then(Value::as_f64)
    }

    /// Any claim by name.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl fmt::Debug for VerifiedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifiedIdentity")
            .field("iss", &self.issuer())
            .field("sub", &self.subject().map(|_| "[REDACTED]"))
            .field("aud", &self.audience())
            .field("exp", &self.expires_at())
            .finish_non_exhaustive()
    }
}
