//! Authentication middleware for protected routes.
//!
//! `require_auth` runs the JWT gate and injects the verified identity into
//! request extensions. `require_api_token` runs the static API-token gate.
//! Both reject with the same opaque 401.

use crate::auth::{ApiTokenGate, Gate, GateDecision, VerifiedIdentity};
use crate::errors::GateError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// JWT gate built from configuration at startup.
    pub gate: Arc<Gate>,

    /// Static API-token gate.
    pub api_token_gate: Arc<ApiTokenGate>,
}

/// JWT authentication middleware.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// Authorization: <token>
/// ```
///
/// # Response
///
/// - 401 Unauthorized with WWW-Authenticate header on any denial
/// - Otherwise continues, with the `VerifiedIdentity` in extensions when a
///   token was verified (none when the gate is disabled)
#[instrument(skip_all, name = "gate.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    match state.gate.authenticate(req.headers()).await {
        GateDecision::Allow(identity) => {
            if let Some(identity) = identity {
                req.extensions_mut().insert(identity);
            }
            Ok(next.run(req).await)
        }
        GateDecision::Deny(cause) => {
            tracing::debug!(target: "gate.middleware.auth", reason = cause.reason(), "Rejecting request");
            Err(cause.into())
        }
    }
}

/// Static API-token middleware.
#[instrument(skip_all, name = "gate.middleware.api_token")]
pub async fn require_api_token(
    State(state): State<Arc<AuthState>>,
    req: Request,
    next: Next,
) -> Result<Response, GateError> {
    state.api_token_gate.check(req.headers())?;
    Ok(next.run(req).await)
}

/// Extension trait for reading the verified identity from a request.
pub trait IdentityExt {
    /// Returns `None` if the JWT gate did not run or is disabled.
    fn identity(&self) -> Option<&VerifiedIdentity>;
}

impl<B> IdentityExt for axum::extract::Request<B> {
    fn identity(&self) -> Option<&VerifiedIdentity> {
        self.extensions().get::<VerifiedIdentity>()
    }
}
