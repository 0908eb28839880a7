//! Cluster endpoints.

use axum::extract::{OriginalUri, Path, State};
use axum::Json;

use crate::models::{ApiError, ClusterDetailResponse, ClusterListResponse, RequestInfo};
use crate::AppState;
use burrow_core::BurrowError;

#[utoipa::path(
    get,
    path = "/v3/kafka",
    responses((status = 200, description = "List of configured clusters")),
    tag = "clusters"
)]
pub async fn cluster_list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Json<ClusterListResponse> {
    let clusters = state.storage.clusters().to_vec();
    Json(ClusterListResponse {
        error: false,
        message: "cluster list returned".to_string(),
        clusters,
        request: RequestInfo::new(uri.path()),
    })
}

#[utoipa::path(
    get,
    path = "/v3/kafka/{cluster}",
    params(("cluster" = String, Path, description = "Cluster name")),
    responses(
        (status = 200, description = "Cluster module summary and counts"),
        (status = 404, description = "Cluster not configured")
    ),
    tag = "clusters"
)]
pub async fn cluster_detail(
    State(state): State<AppState>,
    Path(cluster): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ClusterDetailResponse>, ApiError> {
    let module = state
        .clusters
        .iter()
        .find(|c| c.name == cluster)
        .cloned()
        .ok_or_else(|| {
            ApiError::new(BurrowError::ClusterNotFound(cluster.clone()), uri.path())
        })?;

    let status = state
        .storage
        .fetch_cluster_status(&cluster)
        .await
        .map_err(|e| ApiError::new(e, uri.path()))?;

    Ok(Json(ClusterDetailResponse {
        error: false,
        message: "cluster module detail returned".to_string(),
        module,
        status,
        request: RequestInfo::new(uri.path()),
    }))
}
