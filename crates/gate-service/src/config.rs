//! Gate service configuration.
//!
//! Configuration is loaded from environment variables once at startup and is
//! immutable afterwards. Empty values are treated as unset. The API token is
//! redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default key cache TTL in milliseconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_MS: u64 = 300_000;

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_JWKS_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for the JWKS fetch timeout in seconds.
pub const MAX_JWKS_TIMEOUT_SECONDS: u64 = 60;

/// Default graceful shutdown drain period in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 30;

/// JWT gate settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Master switch. When false every request is allowed.
    pub enabled: bool,

    /// Exact `iss` value to accept.
    pub issuer: Option<String>,

    /// Expected `aud`; `None` disables the audience check.
    pub audience: Option<String>,

    /// URL of the issuer's JWKS endpoint.
    pub jwks_url: Option<String>,

    /// How long a resolved key stays cached.
    pub cache_ttl: Duration,

    /// Upper bound for a single JWKS fetch.
    pub fetch_timeout: Duration,
}

/// Static API-token gate settings.
#[derive(Clone)]
pub struct ApiTokenConfig {
    pub enabled: bool,
    pub token: Option<SecretString>,
}

impl fmt::Debug for ApiTokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiTokenConfig")
            .field("enabled", &self.enabled)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Gate service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    pub auth: AuthConfig,

    pub api_token: ApiTokenConfig,

    /// Seconds to wait between marking not-ready and closing the listener.
    pub drain_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid JWKS timeout configuration: {0}")]
    InvalidJwksTimeout(String),

    #[error("Invalid drain period configuration: {0}")]
    InvalidDrainPeriod(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };

        let bind_address = get("BIND_ADDRESS")
            .unwrap_or(DEFAULT_BIND_ADDRESS)
            .to_string();

        // AUTH_JWT_ENABLED wins when set; otherwise the shared security flag applies
        let auth_enabled = get("AUTH_JWT_ENABLED").or_else(|| get("API_SECURITY_ENABLED")) == Some("true");

        let cache_ttl = Duration::from_millis(parse_cache_ttl_ms(get("AUTH_JWKS_CACHE_TTL_MS")));

        let fetch_timeout = if let Some(value_str) = get("AUTH_JWKS_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwksTimeout(format!(
                    "AUTH_JWKS_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 || value > MAX_JWKS_TIMEOUT_SECONDS {
                return Err(ConfigError::InvalidJwksTimeout(format!(
                    "AUTH_JWKS_TIMEOUT_SECONDS must be between 1 and {MAX_JWKS_TIMEOUT_SECONDS}, got {value}"
                )));
            }

            Duration::from_secs(value)
        } else {
            Duration::from_secs(DEFAULT_JWKS_TIMEOUT_SECONDS)
        };

        let auth = AuthConfig {
            enabled: auth_enabled,
            issuer: get("AUTH_ISSUER").map(ToString::to_string),
            audience: get("AUTH_AUDIENCE").map(ToString::to_string),
            jwks_url: get("AUTH_JWKS_URL").map(ToString::to_string),
            cache_ttl,
            fetch_timeout,
        };

        let api_token = ApiTokenConfig {
            enabled: get("API_SECURITY_ENABLED") == Some("true"),
            token: get("API_TOKEN").map(|token| SecretString::from(token.to_string())),
        };

        let drain_seconds = match get("GATE_DRAIN_SECONDS") {
            Some(value_str) => value_str.parse().map_err(|e| {
                ConfigError::InvalidDrainPeriod(format!(
                    "GATE_DRAIN_SECONDS must be a valid non-negative integer, got '{value_str}': {e}"
                ))
            })?,
            None => DEFAULT_DRAIN_SECONDS,
        };

        Ok(Config {
            bind_address,
            auth,
            api_token,
            drain_seconds,
        })
    }
}

/// Unset, non-numeric, zero or negative values fall back to the default.
/// Positive fractions round up to the next whole millisecond.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn parse_cache_ttl_ms(value: Option<&str>) -> u64 {
    let Some(value_str) = value else {
        return DEFAULT_JWKS_CACHE_TTL_MS;
    };

    match value_str.parse::<f64>() {
        Ok(ms) if ms.is_finite() && ms > 0.0 => ms.ceil().min(u64::MAX as f64) as u64,
        _ => {
            tracing::warn!(
                target: "gate.config",
                value = %value_str,
                default_ms = DEFAULT_JWKS_CACHE_TTL_MS,
                "Invalid AUTH_JWKS_CACHE_TTL_MS, using default"
            );
            DEFAULT_JWKS_CACHE_TTL_MS
        }
    }
}
