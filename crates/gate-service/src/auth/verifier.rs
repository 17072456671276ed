//! RS256 signature verification.
//!
//! Verifies PKCS#1 v1.5 SHA-256 signatures with `jsonwebtoken` over the exact
//! `header.payload` bytes that were transmitted. Keys below 2048 bits are
//! refused.

use crate::auth::error::AuthError;
use crate::auth::keys::{KeyMaterial, SigningKey};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{crypto, Algorithm, DecodingKey};
use serde_json::{Map, Value};

/// Claims whose signature has been verified, not yet checked for time,
/// issuer or audience.
///
/// Only [`crate::auth::decoder::DecodedToken::verify`] produces these, so the
/// claims validator cannot be handed unverified input.
#[derive(Debug, Clone)]
pub struct SignedClaims(Map<String, Value>);

impl SignedClaims {
    pub(crate) fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub(crate) fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Verify an RS256 signature.
///
/// # Errors
///
/// Returns `AuthError::SignatureInvalid` if the key material is unusable, the
/// signature length does not match the modulus, or verification fails.
pub fn verify_signature(
    signing_input: &[u8],
    signature: &[u8],
    key: &SigningKey,
) -> Result<(), AuthError> {
    let KeyMaterial::Rsa { modulus, exponent } = key.material() else {
        tracing::debug!(target: "gate.auth.verifier", kid = %key.key_id(), "Key material unusable for RS256");
        return Err(AuthError::SignatureInvalid);
    };

    let decoding_key = DecodingKey::from_rsa_raw_components(modulus, exponent);
    let encoded_signature = URL_SAFE_NO_PAD.encode(signature);

    match crypto::verify(&encoded_signature, signing_input, &decoding_key, Algorithm::RS256) {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::debug!(target: "gate.auth.verifier", kid = %key.key_id(), "Signature verification failed");
            Err(AuthError::SignatureInvalid)
        }
        Err(e) => {
            tracing::debug!(target: "gate.auth.verifier", kid = %key.key_id(), error = %e, "Signature verification error");
            Err(AuthError::SignatureInvalid)
        }
    }
}
