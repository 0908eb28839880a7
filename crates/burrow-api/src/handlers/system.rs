//! Health, admin, and documentation endpoints.

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Container-probe health check.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Plain-text healthcheck used by load balancers.
pub async fn admin_check() -> &'static str {
    "GOOD"
}

/// Machine-readable API description.
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    Json(crate::ApiDoc::openapi())
}

/// Catch-all for unknown paths.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"error":true,"message":"invalid request type","result":{}}"#,
    )
}
