//! Internal authentication failure taxonomy.
//!
//! Every variant renders the same `Display` text. The variant itself is only
//! ever seen by server-side logs and metrics; at the HTTP boundary all of them
//! collapse into a single 401 (see `crate::errors::GateError`).

use thiserror::Error;

/// Why a request failed authentication.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Token is not three unpadded base64url segments with JSON header/payload,
    /// or exceeds the size limit.
    #[error("authentication failed")]
    MalformedToken,

    /// Header `alg` is anything other than `RS256`.
    #[error("authentication failed")]
    UnsupportedAlgorithm,

    /// Header has no non-empty string `kid`.
    #[error("authentication failed")]
    MissingKeyId,

    /// The key set document has no key with the requested `kid`.
    #[error("authentication failed")]
    UnknownKey,

    /// The key set endpoint failed, timed out, or returned an unusable document.
    #[error("authentication failed")]
    KeySourceUnavailable,

    /// RS256 verification failed for any reason, including unusable key material.
    #[error("authentication failed")]
    SignatureInvalid,

    /// `exp` missing, non-numeric, or not in the future.
    #[error("authentication failed")]
    Expired,

    /// `nbf` is in the future or not numeric.
    #[error("authentication failed")]
    NotYetValid,

    /// `iss` missing or not equal to the configured issuer.
    #[error("authentication failed")]
    IssuerMismatch,

    /// `aud` missing or not matching the configured audience.
    #[error("authentication failed")]
    AudienceMismatch,

    /// No usable credential in the Authorization header.
    #[error("authentication failed")]
    MissingBearerToken,

    /// The gate is enabled but lacks the settings it needs.
    #[error("authentication failed")]
    MisconfiguredGate,

    /// The static API token did not match.
    #[error("authentication failed")]
    InvalidApiToken,
}

impl AuthError {
    /// Stable snake_case label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnsupportedAlgorithm => "unsupported_algorithm",
            AuthError::MissingKeyId => "missing_key_id",
            AuthError::UnknownKey => "unknown_key",
            AuthError::KeySourceUnavailable => "key_source_unavailable",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::Expired => "expired",
            AuthError::NotYetValid => "not_yet_valid",
            AuthError::IssuerMismatch => "issuer_mismatch",
            AuthError::AudienceMismatch => "audience_mismatch",
            AuthError::MissingBearerToken => "missing_bearer_token",
            AuthError::MisconfiguredGate => "misconfigured_gate",
            AuthError::InvalidApiToken => "invalid_api_token",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AuthError; 13] = [
        AuthError::MalformedToken,
        AuthError::UnsupportedAlgorithm,
        AuthError::MissingKeyId,
        AuthError::UnknownKey,
        AuthError::KeySourceUnavailable,
        AuthError::SignatureInvalid,
        AuthError::Expired,
        AuthError::NotYetValid,
        AuthError::IssuerMismatch,
        AuthError::AudienceMismatch,
        AuthError::MissingBearerToken,
        AuthError::MisconfiguredGate,
        AuthError::InvalidApiToken,
    ];

    #[test]
    fn test_display_is_identical_for_every_variant() {
        for error in ALL {
            assert_eq!(error.to_string(), "authentication failed", "{error:?}");
        }
    }

    #[test]
    fn test_reasons_are_unique() {
        let mut reasons: Vec<&str> = ALL.iter().map(AuthError::reason).collect();
        reasons.sort_unstable();
        reasons.dedup();
        assert_eq!(reasons.len(), ALL.len());
    }
}
