//! Burrow Core Types
//!
//! This crate defines the data model shared by every Burrow subsystem:
//! broker and consumer offset samples, the status model produced by the
//! evaluator, copy-out snapshot types, error types, and the immutable
//! configuration snapshot loaded at startup.
//!
//! ## Types Overview
//!
//! ### BrokerOffset
//! The most recent log end offset (LEO) observed for a topic partition,
//! together with the wall-clock time of the observation.
//!
//! ### OffsetSample
//! One committed consumer offset as stored in a ring: the offset, the
//! producer-supplied commit timestamp, the lag captured at arrival time,
//! and the broker LEO that was visible when the sample was stored.
//!
//! ### ConsumerSnapshot
//! A copy of every ring owned by one consumer group. Snapshots are built
//! by the owning store shard and never alias the shard's internal state.
//!
//! ### GroupStatus / PartitionStatus
//! The evaluator's verdict for a group and for each of its partitions.
//!
//! ## Design Decisions
//!
//! - Timestamps are i64 milliseconds since epoch
//! - Offsets and lag are i64; -1 marks "unknown" (LEO not yet observed)
//! - All types are Serialize/Deserialize so they can flow straight into
//!   API responses and notifier payloads

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    BurrowConfig, ClusterConfig, EvaluatorConfig, HttpConfig, NotifierConfig, NotifierKind,
    StoreConfig,
};
pub use error::{BurrowError, Result};
pub use types::{
    now_ms, BrokerOffset, ClusterStatus, ConsumerSnapshot, GroupStatus, OffsetSample,
    PartitionStatus, PartitionStatusCode, Severity,
};
