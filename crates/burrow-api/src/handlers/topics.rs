//! Topic endpoints.

use axum::extract::{OriginalUri, Path, State};
use axum::Json;

use crate::models::{ApiError, RequestInfo, TopicDetailResponse, TopicListResponse};
use crate::models::ConsumerListResponse;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/v3/kafka/{cluster}/topic",
    params(("cluster" = String, Path, description = "Cluster name")),
    responses(
        (status = 200, description = "Topics with reported broker offsets"),
        (status = 404, description = "Cluster not configured")
    ),
    tag = "topics"
)]
pub async fn topic_list(
    State(state): State<AppState>,
    Path(cluster): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<TopicListResponse>, ApiError> {
    let topics = state
        .storage
        .fetch_topic_list(&cluster)
        .await
        .map_err(|e| ApiError::new(e, uri.path()))?;
    Ok(Json(TopicListResponse {
        error: false,
        message: "topic list returned".to_string(),
        topics,
        request: RequestInfo::new(uri.path()),
    }))
}

#[utoipa::path(
    get,
    path = "/v3/kafka/{cluster}/topic/{topic}",
    params(
        ("cluster" = String, Path, description = "Cluster name"),
        ("topic" = String, Path, description = "Topic name")
    ),
    responses(
        (status = 200, description = "Partition LEOs, indexed by partition"),
        (status = 404, description = "Cluster or topic unknown")
    ),
    tag = "topics"
)]
pub async fn topic_detail(
    State(state): State<AppState>,
    Path((cluster, topic)): Path<(String, String)>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<TopicDetailResponse>, ApiError> {
    let offsets = state
        .storage
        .fetch_topic_offsets(&cluster, &topic)
        .await
        .map_err(|e| ApiError::new(e, uri.path()))?;
    Ok(Json(TopicDetailResponse {
        error: false,
        message: "topic offsets returned".to_string(),
        offsets,
        request: RequestInfo::new(uri.path()),
    }))
}

#[utoipa::path(
    get,
    path = "/v3/kafka/{cluster}/topic/{topic}/consumers",
    params(
        ("cluster" = String, Path, description = "Cluster name"),
        ("topic" = String, Path, description = "Topic name")
    ),
    responses(
        (status = 200, description = "Groups committing offsets on the topic"),
        (status = 404, description = "Cluster not configured")
    ),
    tag = "topics"
)]
pub async fn topic_consumers(
    State(state): State<AppState>,
    Path((cluster, topic)): Path<(String, String)>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ConsumerListResponse>, ApiError> {
    let consumers = state
        .storage
        .fetch_consumers_for_topic(&cluster, &topic)
        .await
        .map_err(|e| ApiError::new(e, uri.path()))?;
    Ok(Json(ConsumerListResponse {
        error: false,
        message: "topic consumer list returned".to_string(),
        consumers,
        request: RequestInfo::new(uri.path()),
    }))
}
