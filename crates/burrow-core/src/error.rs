//! Burrow Error Types
//!
//! This module defines the error type shared by the store, evaluator,
//! notifier, and HTTP subsystems.
//!
//! ## Error Categories
//!
//! ### Lookup Errors
//! - `ClusterNotFound`: request referenced a cluster that was never configured
//! - `GroupNotFound`: no rings exist for the (cluster, group)
//! - `TopicNotFound`: no broker offsets exist for the (cluster, topic)
//!
//! ### Flow-Control Errors
//! - `Busy`: a shard request queue was full and the send timed out
//! - `ShuttingDown`: the store is draining; the request was not serviced
//!
//! ### Data Errors
//! - `Encoding`: a response payload failed to serialize
//! - `Config`: the configuration snapshot failed validation at startup
//!
//! Dropped samples (out-of-order, duplicate, stale) are deliberately NOT
//! errors: producers fire and forget, and drops are only counted.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BurrowError>;

#[derive(Debug, Error)]
pub enum BurrowError {
    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("group not found: {cluster}/{group}")]
    GroupNotFound { cluster: String, group: String },

    #[error("topic not found: {cluster}/{topic}")]
    TopicNotFound { cluster: String, topic: String },

    #[error("request queue full")]
    Busy,

    #[error("shutting down")]
    ShuttingDown,

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl BurrowError {
    /// True for the lookup errors that map to an HTTP 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BurrowError::ClusterNotFound(_)
                | BurrowError::GroupNotFound { .. }
                | BurrowError::TopicNotFound { .. }
        )
    }
}
