//! Current identity handler.
//!
//! Returns the verified claims of the caller.

use crate::auth::VerifiedIdentity;
use crate::models::MeResponse;
use axum::{Extension, Json};
use tracing::instrument;

/// Handler for GET /api/v1/me
///
/// Requires the JWT gate. The identity extension is absent only when the
/// gate is disabled.
///
/// ## Response
///
/// ```json
/// {
///   "iss": "https://issuer.example",
///   "aud": "api",
///   "sub": "user_abc123",
///   "exp": 1234567890
/// }
/// ```
#[instrument(skip_all, name = "gate.handlers.me")]
pub async fn get_me(identity: Option<Extension<VerifiedIdentity>>) -> Json<MeResponse> {
    match identity {
        Some(Extension(identity)) => {
            tracing::debug!(target: "gate.handlers.me", "Returning verified claims");
            Json(MeResponse::Authenticated(identity))
        }
        None => Json(MeResponse::Anonymous {
            authenticated: false,
        }),
    }
}
