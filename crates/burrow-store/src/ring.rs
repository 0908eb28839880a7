//! Bounded ring of consumer offset samples.
//!
//! One ring exists per (cluster, group, topic, partition). The ring keeps
//! the most recent W accepted samples, ordered by commit timestamp, and is
//! the unit over which the evaluator's sliding window runs.
//!
//! ## Acceptance Rules
//!
//! 1. An empty ring accepts any sample.
//! 2. A sample ordered at or before the tail is dropped (replay or
//!    out-of-order arrival).
//! 3. A sample at the tail's offset arriving within `min_distance` of the
//!    tail is dropped as a duplicate commit.
//! 4. A sample whose offset is below the tail's is accepted and marked as
//!    a rewind.
//! 5. When full, accepting a sample evicts the oldest.
//!
//! Consumer sources that supply an explicit `order` value (instead of
//! trustworthy commit timestamps) have that value used as the ordering
//! key; the stored sample keeps the producer timestamp either way.

use burrow_core::OffsetSample;
use std::collections::VecDeque;

/// Result of offering a sample to a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Sample accepted; `rewind` is true when the commit moved backwards.
    Stored { rewind: bool },
    /// Sample ordered at or before the current tail; dropped.
    OutOfOrder,
    /// Same offset as the tail, within the minimum distance; dropped.
    Duplicate,
}

/// Bounded circular buffer of consumer offset samples, oldest first.
#[derive(Debug, Clone)]
pub struct OffsetRing {
    window: VecDeque<OffsetSample>,
    capacity: usize,
    /// Ordering key of the last accepted sample.
    last_order: Option<i64>,
}

impl OffsetRing {
    pub fn new(capacity: usize) -> Self {
        OffsetRing {
            window: VecDeque::with_capacity(capacity),
            capacity,
            last_order: None,
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn head(&self) -> Option<&OffsetSample> {
        self.window.front()
    }

    pub fn tail(&self) -> Option<&OffsetSample> {
        self.window.back()
    }

    /// Copy the window out, oldest first. The copy shares nothing with the
    /// ring; this is how snapshots leave the owning shard.
    pub fn snapshot(&self) -> Vec<OffsetSample> {
        self.window.iter().copied().collect()
    }

    /// Offer a sample to the ring.
    ///
    /// `lag` and `leo` are captured by the caller at arrival time (-1 when
    /// the broker LEO is unknown) and are never revised afterwards.
    pub fn offer(
        &mut self,
        offset: i64,
        timestamp: i64,
        lag: i64,
        leo: i64,
        order: Option<i64>,
        min_distance_ms: i64,
    ) -> PushOutcome {
        let ord = order.unwrap_or(timestamp);
        let mut rewind = false;

        if let Some(tail) = self.window.back() {
            let last_ord = self.last_order.unwrap_or(tail.timestamp);
            if ord <= last_ord {
                return PushOutcome::OutOfOrder;
            }
            if offset == tail.offset && timestamp - tail.timestamp < min_distance_ms {
                return PushOutcome::Duplicate;
            }
            rewind = offset < tail.offset;
        }

        self.window.push_back(OffsetSample {
            offset,
            timestamp,
            lag,
            leo,
            rewind,
        });
        if self.window.len() > self.capacity {
            self.window.pop_front();
        }
        self.last_order = Some(ord);

        PushOutcome::Stored { rewind }
    }
}
