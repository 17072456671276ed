//! Builders for compact tokens.
//!
//! `TokenBuilder` starts from a valid RS256 header and a claim set that
//! passes validation for [`TEST_ISSUER`] / [`TEST_AUDIENCE`], and lets a test
//! change exactly the field it is about. Signing is done with `ring` so any
//! header, including ones a real library refuses to produce, can be signed.

use crate::crypto_fixtures::TestKeypair;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Issuer the default claims carry.
pub const TEST_ISSUER: &str = "https://issuer.example";

/// Audience the default claims carry.
pub const TEST_AUDIENCE: &str = "api";

/// Subject the default claims carry.
pub const TEST_SUBJECT: &str = "user_test_123";

/// Current time in seconds since the Unix epoch.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Builder for signed (or deliberately mis-signed) tokens.
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    header: Map<String, Value>,
    claims: Map<String, Value>,
}

impl TokenBuilder {
    /// Valid header with `kid` and claims expiring in one hour.
    pub fn new(kid: &str) -> Self {
        let now = now();
        let header = json!({ "alg": "RS256", "typ": "JWT", "kid": kid });
        let claims = json!({
            "iss": TEST_ISSUER,
            "aud": TEST_AUDIENCE,
            "sub": TEST_SUBJECT,
            "iat": now,
            "exp": now + 3600,
        });

        Self {
            header: into_map(header),
            claims: into_map(claims),
        }
    }

    /// Builder whose header names `keypair`'s `kid`.
    pub fn for_key(keypair: &TestKeypair) -> Self {
        Self::new(keypair.kid())
    }

    pub fn header(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.header.insert(name.to_string(), value.into());
        self
    }

    pub fn without_header(mut self, name: &str) -> Self {
        self.header.remove(name);
        self
    }

    pub fn claim(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.claims.insert(name.to_string(), value.into());
        self
    }

    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    pub fn issuer(self, issuer: &str) -> Self {
        self.claim("iss", issuer)
    }

    pub fn audience(self, audience: impl Into<Value>) -> Self {
        self.claim("aud", audience)
    }

    /// `exp` relative to now; negative values produce an expired token.
    pub fn expires_in(self, seconds: i64) -> Self {
        self.claim("exp", now() + seconds)
    }

    /// `nbf` relative to now.
    pub fn not_before_in(self, seconds: i64) -> Self {
        self.claim("nbf", now() + seconds)
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// `base64url(header).base64url(payload)`.
    pub fn signing_input(&self) -> String {
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(Value::Object(self.header.clone()).to_string()),
            URL_SAFE_NO_PAD.encode(Value::Object(self.claims.clone()).to_string())
        )
    }

    /// Sign with `keypair`, regardless of which `kid` the header names.
    pub fn sign(&self, keypair: &TestKeypair) -> String {
        let signing_input = self.signing_input();
        let signature = keypair.sign(signing_input.as_bytes());
        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
    }

    /// Attach an arbitrary signature.
    pub fn with_signature(&self, signature: &[u8]) -> String {
        format!(
            "{}.{}",
            self.signing_input(),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }
}

/// Encode `claims` with the `jsonwebtoken` crate instead of the builder, for
/// cross-checking against an independent encoder.
pub fn encode_with_jsonwebtoken(keypair: &TestKeypair, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(keypair.kid().to_string());

    let key = EncodingKey::from_rsa_pem(keypair.private_key_pem().as_bytes())
        .expect("fixture PEM should be a valid RSA key");
    encode(&header, claims, &key).expect("token encoding should succeed")
}

/// Claims that pass validation for [`TEST_ISSUER`] / [`TEST_AUDIENCE`].
pub fn valid_claims() -> Value {
    Value::Object(TokenBuilder::new("unused").claims)
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
