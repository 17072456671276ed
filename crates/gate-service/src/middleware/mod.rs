//! Middleware for the gate service.
//!
//! # Components
//!
//! - `auth` - JWT and API-token guards for protected routes
//! - `http_metrics` - HTTP request metrics middleware

pub mod auth;
pub mod http_metrics;

pub use auth::{require_api_token, require_auth, AuthState, IdentityExt};
pub use http_metrics::http_metrics_middleware;
