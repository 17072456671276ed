//! Bearer-token authentication gate.
//!
//! Verifies RS256-signed tokens against a remote JWKS document before a
//! request reaches its handler:
//!
//! ```text
//! Gate -> decode -> resolve key (cache, fetch on miss) -> verify -> validate claims
//! ```
//!
//! # Modules
//!
//! - `auth` - The gate and its components, plus the static API-token gate
//! - `config` - Service configuration from environment
//! - `errors` - HTTP error mapping (every auth failure is the same 401)
//! - `handlers` - HTTP request handlers
//! - `middleware` - Auth guards and HTTP metrics
//! - `models` - Response models
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
