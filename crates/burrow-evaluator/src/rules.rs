//! The sliding-window rule engine.
//!
//! Rules run over one partition window at a time, in this order:
//!
//! 1. **Empty window**: the partition is omitted from the result.
//! 2. **Minimum samples**: fewer than two samples, or a window spanning
//!    less than twice the minimum commit distance, is OK. New groups get
//!    the benefit of the doubt.
//! 3. **Rewind**: any commit inside the window that moved backwards.
//! 4. **Stop**: offsets frozen across a long-enough window while the
//!    broker LEO advanced.
//! 5. **Stall**: offsets frozen with outstanding lag. Over an incomplete
//!    window the severity is downgraded to WARN.
//! 6. **Warning**: offsets moving, but lag never shrank anywhere in the
//!    window and ended higher than it started.
//! 7. Otherwise OK.
//!
//! Everything here is a pure function: identical snapshots always produce
//! identical results, and no clock or lock is consulted.

use burrow_core::{
    ConsumerSnapshot, GroupStatus, OffsetSample, PartitionStatus, PartitionStatusCode, Severity,
};

/// Thresholds the rules run with, derived from the store configuration.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    /// Full window size W; stalls over fewer samples downgrade to WARN.
    pub window_size: usize,
    /// Minimum accepted commit distance in ms. Windows spanning less than
    /// twice this are too young to judge.
    pub min_distance_ms: i64,
    /// Window span after which frozen offsets with an advancing LEO are a
    /// stop rather than a stall (half the group expiry).
    pub stop_threshold_ms: i64,
}

/// Evaluate a whole group snapshot.
///
/// The overall status is the maximum severity across partitions, and the
/// total lag sums each partition's tail lag with unknown (-1) counting as
/// zero.
pub fn evaluate(snapshot: &ConsumerSnapshot, rules: &RuleConfig) -> GroupStatus {
    let mut partitions: Vec<PartitionStatus> = Vec::new();
    for (topic, windows) in &snapshot.topics {
        for (partition, window) in windows {
            if let Some(status) = classify_window(topic, *partition, window, rules) {
                partitions.push(status);
            }
        }
    }
    partitions.sort_by(|a, b| a.topic.cmp(&b.topic).then(a.partition.cmp(&b.partition)));

    let status = partitions
        .iter()
        .map(|p| p.severity)
        .max()
        .unwrap_or(Severity::Ok);
    let total_lag = partitions.iter().map(|p| p.current_lag.max(0)).sum();

    GroupStatus {
        cluster: snapshot.cluster.clone(),
        group: snapshot.group.clone(),
        status,
        partitions,
        total_lag,
    }
}

/// Classify one partition window, oldest sample first. Returns `None` for
/// an empty window (the partition is omitted).
pub fn classify_window(
    topic: &str,
    partition: i32,
    window: &[OffsetSample],
    rules: &RuleConfig,
) -> Option<PartitionStatus> {
    let head = *window.first()?;
    let tail = *window.last()?;

    let make = |code: PartitionStatusCode, severity: Severity| PartitionStatus {
        topic: topic.to_string(),
        partition,
        status: code,
        severity,
        start: Some(head),
        end: Some(tail),
        current_lag: tail.lag,
        owner: None,
    };
    let ok = || make(PartitionStatusCode::Ok, Severity::Ok);

    // Not enough history to judge.
    if window.len() < 2 {
        return Some(ok());
    }
    let duration = tail.timestamp - head.timestamp;
    if duration < rules.min_distance_ms * 2 {
        return Some(ok());
    }

    // A rewind anywhere after the head, whether marked at store time or
    // visible as an offset decrease between adjacent samples.
    let rewound = window[1..].iter().any(|s| s.rewind)
        || window.windows(2).any(|pair| pair[1].offset < pair[0].offset);
    if rewound {
        return Some(make(PartitionStatusCode::Rewind, Severity::Err));
    }

    let frozen = window.iter().all(|s| s.offset == head.offset);
    if frozen {
        // The broker kept producing while the consumer committed nothing
        // new for a long time.
        if duration >= rules.stop_threshold_ms && head.leo >= 0 && tail.leo > head.leo {
            return Some(make(PartitionStatusCode::Stop, Severity::Err));
        }
        if tail.lag > 0 {
            let severity = if window.len() < rules.window_size {
                Severity::Warn
            } else {
                Severity::Err
            };
            return Some(make(PartitionStatusCode::Stall, severity));
        }
        // Frozen at the log end (or lag unknown): caught up.
        return Some(ok());
    }

    // Offsets are moving; warn only when lag grew monotonically across the
    // whole window. Unknown lag anywhere disables the trend check.
    let strictly_increasing = window.windows(2).all(|pair| pair[1].offset > pair[0].offset);
    let lags_known = window.iter().all(|s| s.lag >= 0);
    let lag_never_shrank = window.windows(2).all(|pair| pair[1].lag >= pair[0].lag);
    if strictly_increasing && lags_known && lag_never_shrank && tail.lag > head.lag {
        return Some(make(PartitionStatusCode::Warn, Severity::Warn));
    }

    Some(ok())
}
