//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - checks that signing keys can be fetched

use crate::errors::GateError;
use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Does NOT check any dependencies; failure means the process is hung.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 when the JWT gate is disabled, or when it is configured and
/// the JWKS endpoint answers with a valid document. Returns 503 otherwise.
/// The key cache is neither read nor written.
///
/// ## Security
///
/// Error messages are intentionally generic. The actual cause is logged
/// server-side.
#[tracing::instrument(skip_all, name = "gate.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Response {
    let gate = &state.auth.gate;

    if !gate.is_enabled() {
        return (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                key_source: Some("disabled"),
                error: None,
            }),
        )
            .into_response();
    }

    match gate.check_key_source().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                key_source: Some("available"),
                error: None,
            }),
        )
            .into_response(),
        Err(e) => GateError::ServiceUnavailable(format!(
            "Readiness check failed: key source {}",
            e.reason()
        ))
        .into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "OK");
    }
}
