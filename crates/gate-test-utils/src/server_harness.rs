//! Test server harness.
//!
//! Provides `TestGateServer` for spawning real gate-service instances, and
//! `build_test_app` for in-process `oneshot` tests against the same router.

use crate::jwks_server::MockJwksServer;
use crate::token_builders::{TEST_AUDIENCE, TEST_ISSUER};
use axum::Router;
use gate_service::config::Config;
use gate_service::observability::metrics::init_metrics_recorder;
use gate_service::routes::{self, AppState};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Shared metrics handle. Only one global recorder can be installed per
/// process, so later callers get a detached handle if installation fails.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Environment for an enabled JWT gate pointed at `jwks`.
pub fn jwt_gate_vars(jwks: &MockJwksServer) -> HashMap<String, String> {
    HashMap::from([
        ("AUTH_JWT_ENABLED".to_string(), "true".to_string()),
        ("AUTH_ISSUER".to_string(), TEST_ISSUER.to_string()),
        ("AUTH_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
        ("AUTH_JWKS_URL".to_string(), jwks.jwks_url()),
        ("AUTH_JWKS_TIMEOUT_SECONDS".to_string(), "2".to_string()),
    ])
}

/// Build the real router from `vars`.
///
/// Returns the state too, so tests can inspect the gate's key cache.
pub fn build_test_app(vars: &HashMap<String, String>) -> (Router, Arc<AppState>) {
    let config = Config::from_vars(vars).expect("test config should load");
    let state = Arc::new(AppState::from_config(config));
    let app = routes::build_routes(Arc::clone(&state), test_metrics_handle());
    (app, state)
}

/// Test harness for spawning the gate service on a random port.
///
/// # Example
/// ```rust,ignore
/// let jwks = MockJwksServer::start().await;
/// let server = TestGateServer::spawn(&jwt_gate_vars(&jwks)).await?;
///
/// let response = reqwest::get(format!("{}/health", server.url())).await?;
/// assert_eq!(response.status(), 200);
/// ```
pub struct TestGateServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    _handle: JoinHandle<()>,
}

impl TestGateServer {
    /// Spawn a server configured from `vars`.
    ///
    /// # Returns
    /// * `Ok(TestGateServer)` - Running server instance
    /// * `Err(anyhow::Error)` - If configuration or binding fails
    pub async fn spawn(vars: &HashMap<String, String>) -> Result<Self, anyhow::Error> {
        let config = Config::from_vars(vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;
        let state = Arc::new(AppState::from_config(config));
        let app = routes::build_routes(Arc::clone(&state), test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

impl Drop for TestGateServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
