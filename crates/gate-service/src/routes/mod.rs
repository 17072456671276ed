//! HTTP routes for the gate service.
//!
//! Defines the Axum router and application state.

use crate::auth::{ApiTokenGate, Gate};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_api_token, require_auth, AuthState};
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Both gates, shared with the auth middleware.
    pub auth: Arc<AuthState>,
}

impl AppState {
    /// Build the gates from configuration. Called once at startup; the key
    /// cache lives exactly as long as the returned state.
    pub fn from_config(config: Config) -> Self {
        let auth = Arc::new(AuthState {
            gate: Arc::new(Gate::from_config(&config.auth)),
            api_token_gate: Arc::new(ApiTokenGate::from_config(&config.api_token)),
        });
        Self { config, auth }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK") - public
/// - `/ready` - Readiness probe (checks the JWKS endpoint) - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/api/v1/me` - Verified identity - requires JWT
/// - `/api/v1/ping` - Status - requires the static API token
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::clone(&state.auth);

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let jwt_routes = Router::new()
        .route("/api/v1/me", get(handlers::get_me))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&auth_state),
            require_auth,
        ));

    let api_token_routes = Router::new()
        .route("/api/v1/ping", get(handlers::ping))
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            require_api_token,
        ));

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(jwt_routes)
        .merge(api_token_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_from_config_builds_disabled_gates_by_default() {
        let config = Config::from_vars(&std::collections::HashMap::new()).unwrap();
        let state = AppState::from_config(config);

        assert!(!state.auth.gate.is_enabled());
        assert!(!state.auth.api_token_gate.is_enabled());
    }
}
