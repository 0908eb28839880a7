//! Burrow HTTP Frontend
//!
//! HTTP/JSON query interface over the offset store and evaluator. The
//! frontend is a pass-through: list endpoints go straight to the store's
//! fetch requests, status endpoints to the evaluator, and nothing here
//! holds state of its own.
//!
//! ## Endpoints
//!
//! | Method | Path | Returns |
//! |---|---|---|
//! | GET | `/v3/kafka` | configured clusters |
//! | GET | `/v3/kafka/{cluster}` | cluster module summary |
//! | GET | `/v3/kafka/{cluster}/topic` | topic list |
//! | GET | `/v3/kafka/{cluster}/topic/{topic}` | partition LEOs |
//! | GET | `/v3/kafka/{cluster}/topic/{topic}/consumers` | groups on the topic |
//! | GET | `/v3/kafka/{cluster}/consumer` | group list |
//! | GET | `/v3/kafka/{cluster}/consumer/{group}` | ring contents |
//! | GET | `/v3/kafka/{cluster}/consumer/{group}/status` | status summary |
//! | GET | `/v3/kafka/{cluster}/consumer/{group}/lag` | full status |
//! | DELETE | `/v3/kafka/{cluster}/consumer/{group}` | remove group |
//!
//! Plus `/health`, `/burrow/admin`, `/metrics` (Prometheus text), and
//! `/api-docs/openapi.json`.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use burrow_core::{BurrowError, ClusterConfig, HttpConfig, Result};
use burrow_evaluator::Evaluator;
use burrow_store::StorageHandle;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;

pub mod handlers;
pub mod models;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: StorageHandle,
    pub evaluator: Arc<Evaluator>,
    pub clusters: Arc<Vec<ClusterConfig>>,
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState, config: &HttpConfig) -> Router {
    let v3_routes = Router::new()
        .route("/v3/kafka", get(handlers::clusters::cluster_list))
        .route("/v3/kafka/:cluster", get(handlers::clusters::cluster_detail))
        .route("/v3/kafka/:cluster/topic", get(handlers::topics::topic_list))
        .route(
            "/v3/kafka/:cluster/topic/:topic",
            get(handlers::topics::topic_detail),
        )
        .route(
            "/v3/kafka/:cluster/topic/:topic/consumers",
            get(handlers::topics::topic_consumers),
        )
        .route(
            "/v3/kafka/:cluster/consumer",
            get(handlers::consumers::consumer_list),
        )
        .route(
            "/v3/kafka/:cluster/consumer/:group",
            get(handlers::consumers::consumer_detail)
                .delete(handlers::consumers::consumer_delete),
        )
        .route(
            "/v3/kafka/:cluster/consumer/:group/status",
            get(handlers::consumers::consumer_status),
        )
        .route(
            "/v3/kafka/:cluster/consumer/:group/lag",
            get(handlers::consumers::consumer_lag),
        )
        .with_state(state);

    Router::new()
        .merge(v3_routes)
        .route("/health", get(handlers::system::health_check))
        .route("/burrow/admin", get(handlers::system::admin_check))
        .route("/api-docs/openapi.json", get(handlers::system::openapi_spec))
        .merge(burrow_observability::exporter::create_metrics_router())
        .fallback(handlers::system::not_found)
        .layer(axum::middleware::from_fn(handlers::log_requests))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeout_secs)))
        .layer(CorsLayer::permissive())
}

/// Bind the listener. Separated from [`serve_with_listener`] so a caller's
/// start phase can fail fast on a bad address.
pub async fn bind(address: &str) -> Result<tokio::net::TcpListener> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|e| BurrowError::Config(format!("cannot bind {}: {}", address, e)))?;
    tracing::info!(address = %address, "http server listening");
    Ok(listener)
}

/// Start the API server; resolves once the shutdown signal fires and
/// in-flight requests have drained.
pub async fn serve(router: Router, address: &str, shutdown: watch::Receiver<bool>) -> Result<()> {
    let listener = bind(address).await?;
    serve_with_listener(listener, router, shutdown).await
}

/// Serve on an already-bound listener.
pub async fn serve_with_listener(
    listener: tokio::net::TcpListener,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await
        .map_err(|e| BurrowError::Config(format!("http server failed: {}", e)))
}

/// OpenAPI specification
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::clusters::cluster_list,
        handlers::clusters::cluster_detail,
        handlers::topics::topic_list,
        handlers::topics::topic_detail,
        handlers::topics::topic_consumers,
        handlers::consumers::consumer_list,
        handlers::consumers::consumer_detail,
        handlers::consumers::consumer_status,
        handlers::consumers::consumer_lag,
        handlers::consumers::consumer_delete,
    ),
    tags(
        (name = "clusters", description = "Cluster inventory"),
        (name = "topics", description = "Broker-side topic state"),
        (name = "consumers", description = "Consumer group state and status"),
    )
)]
pub struct ApiDoc;
