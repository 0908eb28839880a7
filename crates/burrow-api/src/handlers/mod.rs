//! Request handlers for the v3 API.

pub mod clusters;
pub mod consumers;
pub mod system;
pub mod topics;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

/// Per-request log line with method, path, and resulting status.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    debug!(%method, path, status = response.status().as_u16(), "http request");
    response
}
