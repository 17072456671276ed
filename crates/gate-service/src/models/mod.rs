//! Response models for the gate service.

use crate::auth::VerifiedIdentity;
use serde::Serialize;

/// Readiness probe response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,

    /// Key source state: "disabled", "available" or "unavailable".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_source: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for `/api/v1/me`.
///
/// The verified claims as-is, or `{"authenticated": false}` when the JWT gate
/// is disabled and no identity exists.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MeResponse {
    Authenticated(VerifiedIdentity),
    Anonymous { authenticated: bool },
}

/// Response for `/api/v1/ping`.
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
}
