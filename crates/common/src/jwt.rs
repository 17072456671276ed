//! Compact JWT primitives shared by the gate crates.
//!
//! This module knows how a compact token is laid out on the wire and nothing
//! about keys or trust:
//! - Size limit applied before any parsing
//! - Splitting into the three `.`-separated segments
//! - Unpadded base64url segment decoding
//! - The JOSE header fields the gate cares about (`alg`, `kid`, `typ`)
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing here verifies a signature; callers must never trust decoded
//!   segments until the signature over [`CompactToken::signing_input`] checks out
//! - Error messages are intentionally generic to prevent information leakage

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical RS256 tokens are well under 2KB. Anything larger is rejected
/// before base64 decoding allocates buffers for it.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// The only signature algorithm the gate accepts.
pub const SUPPORTED_ALGORITHM: &str = "RS256";

// =============================================================================
// Error Types
// =============================================================================

/// Structural errors for compact tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtFormatError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token is not three base64url segments separated by dots.
    #[error("The access token is invalid or expired")]
    MalformedToken,
}

// =============================================================================
// Types
// =============================================================================

/// JOSE header of a compact token.
///
/// `alg` is required; a header without it does not deserialize. `kid` is kept
/// as a raw JSON value so that a non-string `kid` can be told apart from a
/// malformed header.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtHeader {
    /// Signature algorithm named by the token.
    pub alg: String,

    /// Key identifier, if present.
    #[serde(default)]
    pub kid: Option<serde_json::Value>,

    /// Media type, informational only.
    #[serde(default)]
    pub typ: Option<String>,
}

impl JwtHeader {
    /// Returns the key identifier when it is a non-empty string.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.kid
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .filter(|kid| !kid.is_empty())
    }
}

/// A compact token split into its three segments, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactToken<'a> {
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
    signing_input: &'a str,
}

impl<'a> CompactToken<'a> {
    /// Split a compact token into header, payload and signature segments.
    ///
    /// # Errors
    ///
    /// - `TokenTooLarge` - token exceeds [`MAX_JWT_SIZE_BYTES`]
    /// - `MalformedToken` - token does not have exactly three segments
    pub fn split(token: &'a str) -> Result<Self, JwtFormatError> {
        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::debug!(
                target: "common.jwt",
                token_size = token.len(),
                max_size = MAX_JWT_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(JwtFormatError::TokenTooLarge);
        }

        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
            return Err(JwtFormatError::MalformedToken);
        };

        // header.payload, exactly as transmitted
        let signing_input = token
            .get(..header.len() + 1 + payload.len())
            .ok_or(JwtFormatError::MalformedToken)?;

        Ok(Self {
            header,
            payload,
            signature,
            signing_input,
        })
    }

    /// Raw header segment.
    #[must_use]
    pub fn header_segment(&self) -> &'a str {
        self.header
    }

    /// Raw payload segment.
    #[must_use]
    pub fn payload_segment(&self) -> &'a str {
        self.payload
    }

    /// Raw signature segment.
    #[must_use]
    pub fn signature_segment(&self) -> &'a str {
        self.signature
    }

    /// The bytes the signature is computed over: `header.payload` as transmitted.
    #[must_use]
    pub fn signing_input(&self) -> &'a [u8] {
        self.signing_input.as_bytes()
    }

    /// Decode and parse the header segment.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken` if the segment is not unpadded base64url or
    /// does not hold a JSON object with a string `alg`.
    pub fn decode_header(&self) -> Result<JwtHeader, JwtFormatError> {
        let bytes = decode_segment(self.header).map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
            JwtFormatError::MalformedToken
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
            JwtFormatError::MalformedToken
        })
    }

    /// Decode and parse the payload segment into a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken` if the segment is not unpadded base64url or
    /// is not a JSON object.
    pub fn decode_payload(
        &self,
    ) -> Result<serde_json::Map<String, serde_json::Value>, JwtFormatError> {
        let bytes = decode_segment(self.payload).map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT payload base64");
            JwtFormatError::MalformedToken
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT payload JSON");
            JwtFormatError::MalformedToken
        })
    }

    /// Decode the signature segment into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken` if the segment is not unpadded base64url.
    pub fn decode_signature(&self) -> Result<Vec<u8>, JwtFormatError> {
        decode_segment(self.signature).map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT signature base64");
            JwtFormatError::MalformedToken
        })
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Decode an unpadded base64url segment.
///
/// Used for token segments and for JWK `n`/`e` members.
///
/// # Errors
///
/// Returns `base64::DecodeError` for padded input or characters outside the
/// URL-safe alphabet.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(segment)
}

/// Current time as Unix epoch seconds.
#[must_use]
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

// =============================================================================
// Tests
// =============================================================================
