//! Response envelope types for the v3 API.
//!
//! Every successful response carries `error: false`, a human-readable
//! message, the payload, and a `request` block echoing the URI and the
//! serving host. Errors use the same envelope with `error: true` and an
//! empty `result` object.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use burrow_core::{BurrowError, ClusterConfig, ClusterStatus, ConsumerSnapshot, GroupStatus, OffsetSample};

/// Echo of the request, included in every response body.
#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
    pub uri: String,
    pub host: String,
}

impl RequestInfo {
    pub fn new(path: &str) -> Self {
        RequestInfo {
            uri: path.to_string(),
            host: hostname(),
        }
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

#[derive(Debug, Serialize)]
pub struct ClusterListResponse {
    pub error: bool,
    pub message: String,
    pub clusters: Vec<String>,
    pub request: RequestInfo,
}

#[derive(Debug, Serialize)]
pub struct ClusterDetailResponse {
    pub error: bool,
    pub message: String,
    pub module: ClusterConfig,
    pub status: ClusterStatus,
    pub request: RequestInfo,
}

#[derive(Debug, Serialize)]
pub struct TopicListResponse {
    pub error: bool,
    pub message: String,
    pub topics: Vec<String>,
    pub request: RequestInfo,
}

#[derive(Debug, Serialize)]
pub struct TopicDetailResponse {
    pub error: bool,
    pub message: String,
    /// LEOs indexed by partition; -1 for partitions not yet reported.
    pub offsets: Vec<i64>,
    pub request: RequestInfo,
}

#[derive(Debug, Serialize)]
pub struct ConsumerListResponse {
    pub error: bool,
    pub message: String,
    pub consumers: Vec<String>,
    pub request: RequestInfo,
}

#[derive(Debug, Serialize)]
pub struct ConsumerDetailResponse {
    pub error: bool,
    pub message: String,
    /// topic -> per-partition windows, indexed by partition.
    pub topics: HashMap<String, Vec<Vec<OffsetSample>>>,
    pub request: RequestInfo,
}

#[derive(Debug, Serialize)]
pub struct ConsumerStatusResponse {
    pub error: bool,
    pub message: String,
    pub status: GroupStatus,
    pub request: RequestInfo,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub error: bool,
    pub message: String,
    pub request: RequestInfo,
}

/// Flatten a snapshot's windows into arrays indexed by partition, with
/// empty windows filling any gaps.
pub fn topics_as_arrays(snapshot: &ConsumerSnapshot) -> HashMap<String, Vec<Vec<OffsetSample>>> {
    let mut topics = HashMap::new();
    for (topic, partitions) in &snapshot.topics {
        let max_partition = partitions.keys().next_back().copied().unwrap_or(0);
        let mut windows = vec![Vec::new(); max_partition as usize + 1];
        for (partition, window) in partitions {
            windows[*partition as usize] = window.clone();
        }
        topics.insert(topic.clone(), windows);
    }
    topics
}

/// Error half of the envelope. Built from a core error plus the request
/// path, and rendered with the HTTP status the error kind maps to.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub request: RequestInfo,
}

impl ApiError {
    pub fn new(err: BurrowError, path: &str) -> Self {
        let status = match &err {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            BurrowError::Busy | BurrowError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            message: err.to_string(),
            request: RequestInfo::new(path),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": true,
            "message": self.message,
            "request": self.request,
            "result": {},
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_topics_as_arrays_fills_gaps() {
        let sample = OffsetSample {
            offset: 1,
            timestamp: 1,
            lag: 0,
            leo: 1,
            rewind: false,
        };
        let mut partitions = BTreeMap::new();
        partitions.insert(0, vec![sample]);
        partitions.insert(2, vec![sample, sample]);
        let mut snapshot = ConsumerSnapshot {
            cluster: "local".to_string(),
            group: "g".to_string(),
            topics: HashMap::new(),
        };
        snapshot.topics.insert("orders".to_string(), partitions);

        let arrays = topics_as_arrays(&snapshot);
        let windows = &arrays["orders"];
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].len(), 1);
        assert!(windows[1].is_empty());
        assert_eq!(windows[2].len(), 2);
    }

    #[test]
    fn test_api_error_status_mapping() {
        let err = ApiError::new(BurrowError::ClusterNotFound("x".to_string()), "/v3/kafka/x");
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = ApiError::new(BurrowError::Busy, "/v3/kafka");
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
