//! Prometheus text exposition.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, TextEncoder};

use crate::metrics::REGISTRY;

/// Render the whole registry in the Prometheus text format.
pub fn render() -> Result<Vec<u8>, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}

/// Handler behind `GET /metrics`.
pub async fn metrics_handler() -> Response {
    let body = match render() {
        Ok(body) => body,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("metrics encoding failed: {}", e),
            )
                .into_response();
        }
    };
    let content_type = TextEncoder::new().format_type().to_string();
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// Router fragment exposing the registry; merge it into any axum app.
pub fn create_metrics_router() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_metrics_exposition() {
        crate::metrics::init();
        crate::metrics::OFFSETS_STORED_TOTAL
            .with_label_values(&["exporter-test"])
            .inc();

        let response = create_metrics_router()
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; version=0.0.4"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("burrow_offsets_stored_total"));
    }

    #[test]
    fn test_render_produces_text_format() {
        crate::metrics::init();
        let body = render().unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("# HELP"));
    }
}
