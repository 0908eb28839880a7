//! Burrow Observability
//!
//! Prometheus metrics for the offset store, evaluator, and notifier.
//!
//! # Usage
//!
//! ```no_run
//! use burrow_observability::{metrics, exporter};
//!
//! // Initialize metrics
//! metrics::init();
//!
//! // Mount the exporter on any axum router
//! let metrics_router = exporter::create_metrics_router();
//! ```

pub mod exporter;
pub mod metrics;

pub use metrics::{init as init_metrics, REGISTRY};
