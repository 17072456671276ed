//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports types from the [`secrecy`] crate. Use these for every value that
//! grants access on its own: static API tokens, bearer tokens held in memory,
//! and any future shared secrets.
//!
//! `SecretString` implements `Debug` with redaction, so a struct that derives
//! `Debug` while holding one stays safe to log via `{:?}` or tracing fields.
//! Secrets are zeroized when dropped.
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct ApiTokenSettings {
//!     enabled: bool,
//!     token: SecretString,
//! }
//!
//! let settings = ApiTokenSettings {
//!     enabled: true,
//!     token: SecretString::from("s3cr3t-token"),
//! };
//!
//! // Safe: the token is redacted
//! println!("{:?}", settings);
//!
//! // Reading the value requires an explicit call
//! let token: &str = settings.token.expose_secret();
//! ```

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretString};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("token-123");
        assert_eq!(secret.expose_secret(), "token-123");
    }

    #[test]
    fn test_struct_with_secret_is_safe() {
        #[allow(dead_code)]
        #[derive(Debug)]
        struct ApiTokenSettings {
            realm: String,
            token: SecretString,
        }

        let settings = ApiTokenSettings {
            realm: "internal-api".to_string(),
            token: SecretString::from("static-api-token"),
        };

        let debug_str = format!("{settings:?}");

        assert!(debug_str.contains("internal-api"));
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("static-api-token"));
    }

    #[test]
    fn test_deserialize() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct ServiceToken {
            name: String,
            token: SecretString,
        }

        let json = r#"{"name": "reporting", "token": "my-secret-value"}"#;
        let parsed: ServiceToken = serde_json::from_str(json).expect("deserialize");

        assert_eq!(parsed.token.expose_secret(), "my-secret-value");

        let debug = format!("{parsed:?}");
        assert!(!debug.contains("my-secret-value"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_clone_works() {
        let secret = SecretString::from("cloneable");
        let cloned = secret.clone();
        assert_eq!(cloned.expose_secret(), "cloneable");
    }
}
