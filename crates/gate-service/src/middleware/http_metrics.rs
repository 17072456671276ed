//! HTTP metrics middleware.
//!
//! Captures metrics for every HTTP response, including 401s produced by the
//! auth guards and framework-level errors that occur before handlers run
//! (404 Not Found, 405 Method Not Allowed).

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Records method, normalized path, status code and duration.
///
/// Applied as the outermost layer so guard rejections are counted too.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());

    response
}
