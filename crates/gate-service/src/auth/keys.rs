//! Signing keys resolved from the key set document.
//!
//! A [`SigningKey`] is built once from a [`Jwk`] when it is first resolved.
//! Validation of the JWK happens here, so the verifier only ever sees either
//! usable RSA components or an explicit [`KeyMaterial::Unusable`] marker.

use crate::auth::jwks::Jwk;
use common::jwt::{decode_segment, SUPPORTED_ALGORITHM};
use std::fmt;

/// Public key material for a signing key.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// RSA public key, big-endian without leading zero bytes.
    Rsa { modulus: Vec<u8>, exponent: Vec<u8> },

    /// The JWK cannot verify RS256 signatures (wrong `kty`/`alg`, bad encoding).
    Unusable,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Rsa { modulus, .. } => f
                .debug_struct("Rsa")
                .field("modulus_bits", &(modulus.len() * 8))
                .finish_non_exhaustive(),
            KeyMaterial::Unusable => f.write_str("Unusable"),
        }
    }
}

/// A public key from the key set, identified by its own `kid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    key_id: String,
    material: KeyMaterial,
}

impl SigningKey {
    /// Build a signing key from a JWK.
    ///
    /// Returns `None` when the JWK carries no `kid`; such entries can never be
    /// selected by a token and are never cached.
    pub fn from_jwk(jwk: &Jwk) -> Option<Self> {
        let key_id = jwk.kid.as_ref().filter(|kid| !kid.is_empty())?.clone();
        let material = KeyMaterial::from_jwk(jwk);

        if material == KeyMaterial::Unusable {
            tracing::warn!(
                target: "gate.auth.keys",
                kid = %key_id,
                kty = %jwk.kty,
                "JWK cannot be used for RS256 verification"
            );
        }

        Some(Self { key_id, material })
    }

    /// The key's own identifier from the key set document.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Always `RS256`; the only algorithm the gate verifies.
    pub fn algorithm(&self) -> &'static str {
        SUPPORTED_ALGORITHM
    }

    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }
}

impl KeyMaterial {
    fn from_jwk(jwk: &Jwk) -> Self {
        if jwk.kty != "RSA" {
            return KeyMaterial::Unusable;
        }
        if let Some(alg) = &jwk.alg {
            if alg != SUPPORTED_ALGORITHM {
                return KeyMaterial::Unusable;
            }
        }

        let (Some(n), Some(e)) = (&jwk.n, &jwk.e) else {
            return KeyMaterial::Unusable;
        };

        match (decode_segment(n), decode_segment(e)) {
            (Ok(modulus), Ok(exponent)) => KeyMaterial::Rsa {
                modulus: strip_leading_zeros(modulus),
                exponent: strip_leading_zeros(exponent),
            },
            _ => KeyMaterial::Unusable,
        }
    }
}

/// Some encoders emit a sign byte in front of the modulus.
fn strip_leading_zeros(mut bytes: Vec<u8>) -> Vec<u8> {
    let zeros = bytes.iter().take_while(|b| **b == 0).count();
    bytes.drain(..zeros);
    bytes
}
