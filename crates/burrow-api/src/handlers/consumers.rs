//! Consumer group endpoints.

use axum::extract::{OriginalUri, Path, State};
use axum::Json;

use crate::models::{
    topics_as_arrays, ActionResponse, ApiError, ConsumerDetailResponse, ConsumerListResponse,
    ConsumerStatusResponse, RequestInfo,
};
use crate::AppState;
use burrow_core::Severity;

#[utoipa::path(
    get,
    path = "/v3/kafka/{cluster}/consumer",
    params(("cluster" = String, Path, description = "Cluster name")),
    responses(
        (status = 200, description = "Known consumer groups"),
        (status = 404, description = "Cluster not configured")
    ),
    tag = "consumers"
)]
pub async fn consumer_list(
    State(state): State<AppState>,
    Path(cluster): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ConsumerListResponse>, ApiError> {
    let consumers = state
        .storage
        .fetch_group_list(&cluster)
        .await
        .map_err(|e| ApiError::new(e, uri.path()))?;
    Ok(Json(ConsumerListResponse {
        error: false,
        message: "consumer list returned".to_string(),
        consumers,
        request: RequestInfo::new(uri.path()),
    }))
}

#[utoipa::path(
    get,
    path = "/v3/kafka/{cluster}/consumer/{group}",
    params(
        ("cluster" = String, Path, description = "Cluster name"),
        ("group" = String, Path, description = "Consumer group")
    ),
    responses(
        (status = 200, description = "Ring contents per partition"),
        (status = 404, description = "Cluster or group unknown")
    ),
    tag = "consumers"
)]
pub async fn consumer_detail(
    State(state): State<AppState>,
    Path((cluster, group)): Path<(String, String)>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ConsumerDetailResponse>, ApiError> {
    let snapshot = state
        .storage
        .fetch_consumer(&cluster, &group)
        .await
        .map_err(|e| ApiError::new(e, uri.path()))?;
    Ok(Json(ConsumerDetailResponse {
        error: false,
        message: "consumer detail returned".to_string(),
        topics: topics_as_arrays(&snapshot),
        request: RequestInfo::new(uri.path()),
    }))
}

#[utoipa::path(
    get,
    path = "/v3/kafka/{cluster}/consumer/{group}/status",
    params(
        ("cluster" = String, Path, description = "Cluster name"),
        ("group" = String, Path, description = "Consumer group")
    ),
    responses(
        (status = 200, description = "Status summary; partition detail omitted when OK"),
        (status = 404, description = "Cluster or group unknown")
    ),
    tag = "consumers"
)]
pub async fn consumer_status(
    State(state): State<AppState>,
    Path((cluster, group)): Path<(String, String)>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ConsumerStatusResponse>, ApiError> {
    let mut status = state
        .evaluator
        .group_status(&cluster, &group)
        .await
        .map_err(|e| ApiError::new(e, uri.path()))?;

    // The summary endpoint keeps healthy responses small.
    if status.status == Severity::Ok {
        status.partitions.clear();
    }

    Ok(Json(ConsumerStatusResponse {
        error: false,
        message: "consumer status returned".to_string(),
        status,
        request: RequestInfo::new(uri.path()),
    }))
}

#[utoipa::path(
    get,
    path = "/v3/kafka/{cluster}/consumer/{group}/lag",
    params(
        ("cluster" = String, Path, description = "Cluster name"),
        ("group" = String, Path, description = "Consumer group")
    ),
    responses(
        (status = 200, description = "Full status including every partition"),
        (status = 404, description = "Cluster or group unknown")
    ),
    tag = "consumers"
)]
pub async fn consumer_lag(
    State(state): State<AppState>,
    Path((cluster, group)): Path<(String, String)>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ConsumerStatusResponse>, ApiError> {
    let status = state
        .evaluator
        .group_status(&cluster, &group)
        .await
        .map_err(|e| ApiError::new(e, uri.path()))?;
    Ok(Json(ConsumerStatusResponse {
        error: false,
        message: "consumer status returned".to_string(),
        status,
        request: RequestInfo::new(uri.path()),
    }))
}

#[utoipa::path(
    delete,
    path = "/v3/kafka/{cluster}/consumer/{group}",
    params(
        ("cluster" = String, Path, description = "Cluster name"),
        ("group" = String, Path, description = "Consumer group")
    ),
    responses(
        (status = 200, description = "Group removed from the store"),
        (status = 404, description = "Cluster or group unknown")
    ),
    tag = "consumers"
)]
pub async fn consumer_delete(
    State(state): State<AppState>,
    Path((cluster, group)): Path<(String, String)>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ActionResponse>, ApiError> {
    state
        .storage
        .delete_group(&cluster, &group)
        .await
        .map_err(|e| ApiError::new(e, uri.path()))?;
    state.evaluator.invalidate(&cluster, &group).await;

    Ok(Json(ActionResponse {
        error: false,
        message: "consumer group removed".to_string(),
        request: RequestInfo::new(uri.path()),
    }))
}
