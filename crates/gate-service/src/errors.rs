//! Gate service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. Every
//! authentication failure becomes the same 401 with the same body, whatever
//! the underlying `AuthError`. Reasons are logged server-side only.

use crate::auth::AuthError;
use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

const WWW_AUTHENTICATE_VALUE: &str = r#"Bearer realm="api", error="invalid_token""#;

/// Gate service error type.
///
/// Maps to HTTP status codes:
/// - Unauthorized: 401 Unauthorized
/// - ServiceUnavailable: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Authentication failed")]
    Unauthorized,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl GateError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            GateError::Unauthorized => 401,
            GateError::ServiceUnavailable(_) => 503,
        }
    }
}

/// Collapse point for authentication failures. The cause is dropped here.
impl From<AuthError> for GateError {
    fn from(_: AuthError) -> Self {
        GateError::Unauthorized
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            GateError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication failed",
            ),
            GateError::ServiceUnavailable(reason) => {
                tracing::warn!(target: "gate.availability", reason = %reason, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable",
                )
            }
        };

        let mut response = (
            status,
            Json(ErrorResponse {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
            );
        }

        response
    }
}
