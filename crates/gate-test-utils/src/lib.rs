//! # Gate Test Utilities
//!
//! Shared test utilities for the gate service.
//!
//! This crate provides:
//! - Fixed RSA keypairs and JWKS documents (`crypto_fixtures`)
//! - Token builders signing with `ring` (`token_builders`)
//! - A `wiremock` JWKS endpoint (`jwks_server`)
//! - Server test harness (`TestGateServer`, `build_test_app`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gate_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let jwks = MockJwksServer::start().await;
//!     let key = TestKeypair::primary("k1");
//!     jwks.serve_keys(&[&key]).await;
//!
//!     let server = TestGateServer::spawn(&jwt_gate_vars(&jwks)).await?;
//!     let token = TokenBuilder::for_key(&key).sign(&key);
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/api/v1/me", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_server;
pub mod server_harness;
pub mod token_builders;

pub use crypto_fixtures::{jwks_json, TestKeypair};
pub use jwks_server::MockJwksServer;
pub use server_harness::*;
pub use token_builders::{TokenBuilder, TEST_AUDIENCE, TEST_ISSUER, TEST_SUBJECT};
