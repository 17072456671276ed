//! Token decoder.
//!
//! Splits a compact token and decodes its segments. Nothing here is trusted:
//! the claims stay locked inside [`DecodedToken`] until
//! [`DecodedToken::verify`] has checked the signature.

use crate::auth::error::AuthError;
use crate::auth::keys::SigningKey;
use crate::auth::verifier::{verify_signature, SignedClaims};
use common::jwt::{CompactToken, JwtFormatError, SUPPORTED_ALGORITHM};
use serde_json::{Map, Value};

/// A decoded but unverified token.
#[derive(Debug)]
pub struct DecodedToken {
    header_algorithm: String,
    key_id: String,
    signing_input: Vec<u8>,
    signature: Vec<u8>,
    claims: Map<String, Value>,
}

impl DecodedToken {
    pub fn header_algorithm(&self) -> &str {
        &self.header_algorithm
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// `header.payload` exactly as transmitted.
    pub fn signing_input(&self) -> &[u8] {
        &self.signing_input
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Verify the signature with `key`, releasing the claims on success.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` for any verification failure.
    pub fn verify(self, key: &SigningKey) -> Result<SignedClaims, AuthError> {
        verify_signature(&self.signing_input, &self.signature, key)?;
        Ok(SignedClaims::new(self.claims))
    }
}

/// Decode a compact token.
///
/// # Errors
///
/// - `MalformedToken` - oversized, wrong segment count, bad base64url, or
///   header/payload not JSON objects
/// - `UnsupportedAlgorithm` - header `alg` is not `RS256`
/// - `MissingKeyId` - header lacks a non-empty string `kid`
pub fn decode_token(token: &str) -> Result<DecodedToken, AuthError> {
    let compact = CompactToken::split(token).map_err(malformed)?;
    let header = compact.decode_header().map_err(malformed)?;

    // Checked before anything else is trusted: no "none", no HMAC downgrade
    if header.alg != SUPPORTED_ALGORITHM {
        tracing::debug!(target: "gate.auth.decoder", alg = %header.alg, "Unsupported token algorithm");
        return Err(AuthError::UnsupportedAlgorithm);
    }

    let key_id = header
        .key_id()
        .ok_or_else(|| {
            tracing::debug!(target: "gate.auth.decoder", "Token header missing kid");
            AuthError::MissingKeyId
        })?
        .to_string();

    let claims = compact.decode_payload().map_err(malformed)?;
    let signature = compact.decode_signature().map_err(malformed)?;

    Ok(DecodedToken {
        header_algorithm: header.alg,
        key_id,
        signing_input: compact.signing_input().to_vec(),
        signature,
        claims,
    })
}

fn malformed(_: JwtFormatError) -> AuthError {
    AuthError::MalformedToken
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use common::jwt::MAX_JWT_SIZE_BYTES;

    fn token(header: &str, payload: &str, signature: &[u8]) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }

    #[test]
    fn test_decode_valid_token() {
        let raw = token(
            r#"{"alg":"RS256","typ":"JWT","kid":"k1"}"#,
            r#"{"iss":"https://issuer.example","exp":4102444800}"#,
            &[9, 8, 7],
        );

        let decoded = decode_token(&raw).unwrap();

        assert_eq!(decoded.header_algorithm(), "RS256");
        assert_eq!(decoded.key_id(), "k1");
        assert_eq!(decoded.signature(), &[9, 8, 7]);

        let (signing_input, _) = raw.rsplit_once('.').unwrap();
        assert_eq!(decoded.signing_input(), signing_input.as_bytes());
    }

    #[test]
    fn test_rejects_non_rs256_algorithms() {
        for alg in ["none", "HS256", "RS512", "ES256", "EdDSA", "rs256"] {
            let raw = token(
                &format!(r#"{{"alg":"{alg}","kid":"k1"}}"#),
                r#"{"exp":4102444800}"#,
                b"sig",
            );
            assert_eq!(
                decode_token(&raw).unwrap_err(),
                AuthError::UnsupportedAlgorithm,
                "alg {alg}"
            );
        }
    }

    #[test]
    fn test_rejects_missing_kid() {
        for header in [
            r#"{"alg":"RS256"}"#,
            r#"{"alg":"RS256","kid":""}"#,
            r#"{"alg":"RS256","kid":42}"#,
        ] {
            let raw = token(header, r#"{"exp":4102444800}"#, b"sig");
            assert_eq!(
                decode_token(&raw).unwrap_err(),
                AuthError::MissingKeyId,
                "header {header}"
            );
        }
    }

    #[test]
    fn test_algorithm_checked_before_kid() {
        let raw = token(r#"{"alg":"none"}"#, r#"{}"#, b"");
        assert_eq!(
            decode_token(&raw).unwrap_err(),
            AuthError::UnsupportedAlgorithm
        );
    }

    #[test]
    fn test_rejects_malformed_structure() {
        for raw in ["", "abc", "a.b", "a.b.c.d", "!!!.@@@.###"] {
            assert_eq!(
                decode_token(raw).unwrap_err(),
                AuthError::MalformedToken,
                "token {raw:?}"
            );
        }
    }

    #[test]
    fn test_rejects_non_object_payload() {
        let raw = token(r#"{"alg":"RS256","kid":"k1"}"#, r#""just a string""#, b"sig");
        assert_eq!(decode_token(&raw).unwrap_err(), AuthError::MalformedToken);
    }

    #[test]
    fn test_rejects_padded_signature() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","kid":"k1"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{}"#);
        let raw = format!("{header}.{payload}.AQ==");
        assert_eq!(decode_token(&raw).unwrap_err(), AuthError::MalformedToken);
    }

    #[test]
    fn test_rejects_oversized_token() {
        let raw = token(
            r#"{"alg":"RS256","kid":"k1"}"#,
            &format!(r#"{{"pad":"{}"}}"#, "x".repeat(MAX_JWT_SIZE_BYTES)),
            b"sig",
        );
        assert_eq!(decode_token(&raw).unwrap_err(), AuthError::MalformedToken);
    }
}
