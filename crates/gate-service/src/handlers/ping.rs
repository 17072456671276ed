//! API-token protected liveness check.

use crate::models::PingResponse;
use axum::Json;

/// Handler for GET /api/v1/ping
///
/// Reachable only through `require_api_token`.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { status: "ok" })
}
