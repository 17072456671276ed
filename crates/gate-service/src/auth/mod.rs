//! Authentication for the gate service.
//!
//! # Components
//!
//! - `decoder` - compact token splitting and header/payload decoding
//! - `jwks` - key set document model and HTTP fetcher
//! - `keys` - signing keys built from JWKs
//! - `cache` - TTL key cache shared by all requests
//! - `resolver` - cache-first key lookup with fetch on miss
//! - `verifier` - RS256 signature verification
//! - `claims` - `exp`/`nbf`/`iss`/`aud` validation and the verified identity
//! - `gate` - per-request pipeline and allow/deny decision
//! - `api_token` - static shared-secret guard
//! - `error` - internal failure taxonomy

pub mod api_token;
pub mod cache;
pub mod claims;
pub mod decoder;
pub mod error;
pub mod gate;
pub mod jwks;
pub mod keys;
pub mod resolver;
pub mod verifier;

pub use api_token::ApiTokenGate;
pub use cache::KeyCache;
pub use claims::{ClaimsValidator, VerifiedIdentity};
pub use decoder::{decode_token, DecodedToken};
pub use error::AuthError;
pub use gate::{extract_bearer_token, Gate, GateDecision};
pub use jwks::{HttpKeySetFetcher, Jwk, JwksDocument, KeySetFetcher};
pub use keys::{KeyMaterial, SigningKey};
pub use resolver::KeyResolver;
pub use verifier::{verify_signature, SignedClaims};
