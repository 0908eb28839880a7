//! Offset and Status Type Definitions

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Most recent log end offset observed for a (cluster, topic, partition).
///
/// A newer sample for the same key replaces the older one; partitions only
/// appear after the cluster module reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerOffset {
    /// Log end offset: the next offset a producer will write.
    pub offset: i64,
    /// Wall-clock time of the observation (ms since epoch).
    pub timestamp: i64,
}

/// One committed consumer offset as stored in a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetSample {
    /// Committed offset.
    pub offset: i64,
    /// Producer-supplied commit timestamp (ms since epoch).
    pub timestamp: i64,
    /// Lag captured when the sample was stored. -1 when the broker LEO was
    /// unknown at commit time. Never back-filled by later LEO updates.
    pub lag: i64,
    /// Broker LEO visible when the sample was stored, -1 if unknown.
    pub leo: i64,
    /// True when this commit moved backwards relative to the previous one.
    pub rewind: bool,
}

/// Overall health of a group or partition window.
///
/// Variant order gives the severity ordering: ERR > WARN > OK.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Ok,
    Warn,
    Err,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warn => "WARN",
            Severity::Err => "ERR",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a single partition window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartitionStatusCode {
    /// Consumer is keeping up.
    Ok,
    /// Offsets are moving but lag grows across the whole window.
    Warn,
    /// Offsets unchanged while the broker kept producing.
    Stop,
    /// Offsets unchanged with outstanding lag.
    Stall,
    /// A commit moved backwards inside the window.
    Rewind,
}

impl PartitionStatusCode {
    /// Baseline severity of the code. A stall over an incomplete window is
    /// downgraded to WARN by the evaluator; the code itself stays STALL.
    pub fn severity(&self) -> Severity {
        match self {
            PartitionStatusCode::Ok => Severity::Ok,
            PartitionStatusCode::Warn => Severity::Warn,
            PartitionStatusCode::Stop
            | PartitionStatusCode::Stall
            | PartitionStatusCode::Rewind => Severity::Err,
        }
    }
}

/// Evaluator verdict for one partition of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStatus {
    pub topic: String,
    pub partition: i32,
    pub status: PartitionStatusCode,
    pub severity: Severity,
    /// Oldest sample in the evaluated window.
    pub start: Option<OffsetSample>,
    /// Newest sample in the evaluated window.
    pub end: Option<OffsetSample>,
    /// Lag of the newest sample (-1 when unknown).
    pub current_lag: i64,
    /// Host currently owning the partition, when the consumer module
    /// reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Evaluator verdict for a whole consumer group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStatus {
    pub cluster: String,
    pub group: String,
    pub status: Severity,
    pub partitions: Vec<PartitionStatus>,
    /// Sum of known tail lags across partitions, floored at zero.
    pub total_lag: i64,
}

/// Copy-out of every ring owned by one consumer group.
///
/// Built by the owning store shard under its sole ownership; holds no
/// references into shard state. Windows are ordered oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerSnapshot {
    pub cluster: String,
    pub group: String,
    /// topic name -> partition id -> window samples (oldest first).
    pub topics: HashMap<String, BTreeMap<i32, Vec<OffsetSample>>>,
}

impl ConsumerSnapshot {
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Total number of samples across all windows.
    pub fn sample_count(&self) -> usize {
        self.topics
            .values()
            .flat_map(|parts| parts.values())
            .map(|w| w.len())
            .sum()
    }
}

/// Aggregate counts for one cluster, merged across the broker-offset
/// worker and all store shards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    pub cluster: String,
    pub topics: usize,
    pub partitions: usize,
    pub groups: usize,
    /// Offset writes dropped for this cluster since startup: out-of-order
    /// and duplicate samples rejected by the rings, plus writes bounced
    /// off a full request queue.
    pub dropped_offsets: u64,
}

/// Current wall-clock time in milliseconds since epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
