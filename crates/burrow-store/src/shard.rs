//! Store shard worker.
//!
//! Each shard exclusively owns the group map for the (cluster, group) keys
//! routed to it. All access is single-threaded inside the worker task, so
//! no lock is ever taken; fetches are answered with copy-out snapshots and
//! nothing internal escapes by reference.

use std::collections::HashMap;
use std::sync::Arc;

use burrow_core::ConsumerSnapshot;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::broker::BrokerOffsets;
use crate::ring::{OffsetRing, PushOutcome};
use burrow_observability::metrics::{
    GROUPS_EXPIRED_TOTAL, GROUPS_OWNED, OFFSETS_DROPPED_TOTAL, OFFSETS_STORED_TOTAL,
};

/// Requests handled by a shard worker. Fetch variants carry a single-use
/// reply channel that the worker signals at most once; a worker that stops
/// first drops the sender, which the caller observes as `ShuttingDown`.
pub(crate) enum ShardRequest {
    StoreConsumerOffset {
        cluster: String,
        group: String,
        topic: String,
        partition: i32,
        offset: i64,
        timestamp: i64,
        order: Option<i64>,
    },
    DeleteGroup {
        cluster: String,
        group: String,
        reply: oneshot::Sender<bool>,
    },
    DeleteTopic {
        cluster: String,
        topic: String,
    },
    FetchConsumer {
        cluster: String,
        group: String,
        reply: oneshot::Sender<Option<ConsumerSnapshot>>,
    },
    GroupsForTopic {
        cluster: String,
        topic: String,
        reply: oneshot::Sender<Vec<String>>,
    },
    GroupList {
        cluster: String,
        reply: oneshot::Sender<Vec<String>>,
    },
    ClusterStats {
        cluster: String,
        reply: oneshot::Sender<ShardClusterStats>,
    },
    SweepExpired {
        cutoff_ms: i64,
    },
}

/// Per-cluster counts one shard contributes to a cluster status fetch.
pub(crate) struct ShardClusterStats {
    pub groups: usize,
    /// Samples this shard rejected (out-of-order or duplicate).
    pub dropped_offsets: u64,
}

/// Rings owned for one consumer group, keyed topic -> partition.
struct GroupEntry {
    topics: HashMap<String, HashMap<i32, OffsetRing>>,
    /// Newest accepted commit timestamp; drives expiry sweeping.
    last_commit_ms: i64,
}

pub(crate) struct ShardWorker {
    id: usize,
    /// Metric label, precomputed once.
    label: String,
    groups: HashMap<(String, String), GroupEntry>,
    /// Samples rejected per cluster, surfaced by cluster status fetches.
    dropped: HashMap<String, u64>,
    broker_offsets: Arc<BrokerOffsets>,
    window_size: usize,
    min_distance_ms: i64,
    rx: mpsc::Receiver<ShardRequest>,
    shutdown: watch::Receiver<bool>,
}

impl ShardWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: usize,
        broker_offsets: Arc<BrokerOffsets>,
        window_size: usize,
        min_distance_ms: i64,
        rx: mpsc::Receiver<ShardRequest>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        ShardWorker {
            id,
            label: id.to_string(),
            groups: HashMap::new(),
            dropped: HashMap::new(),
            broker_offsets,
            window_size,
            min_distance_ms,
            rx,
            shutdown,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!(shard = self.id, "shard worker started");
        loop {
            tokio::select! {
                req = self.rx.recv() => match req {
                    Some(req) => self.handle(req),
                    None => break,
                },
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!(shard = self.id, groups = self.groups.len(), "shard worker stopped");
    }

    fn handle(&mut self, req: ShardRequest) {
        match req {
            ShardRequest::StoreConsumerOffset {
                cluster,
                group,
                topic,
                partition,
                offset,
                timestamp,
                order,
            } => self.store_consumer_offset(cluster, group, topic, partition, offset, timestamp, order),
            ShardRequest::DeleteGroup {
                cluster,
                group,
                reply,
            } => {
                let removed = self.groups.remove(&(cluster, group)).is_some();
                self.publish_group_gauge();
                let _ = reply.send(removed);
            }
            ShardRequest::DeleteTopic { cluster, topic } => {
                self.delete_topic(&cluster, &topic);
            }
            ShardRequest::FetchConsumer {
                cluster,
                group,
                reply,
            } => {
                let snapshot = self.snapshot_group(&cluster, &group);
                let _ = reply.send(snapshot);
            }
            ShardRequest::GroupsForTopic {
                cluster,
                topic,
                reply,
            } => {
                let groups = self
                    .groups
                    .iter()
                    .filter(|((c, _), entry)| {
                        *c == cluster
                            && entry.topics.get(&topic).is_some_and(|parts| !parts.is_empty())
                    })
                    .map(|((_, g), _)| g.clone())
                    .collect();
                let _ = reply.send(groups);
            }
            ShardRequest::GroupList { cluster, reply } => {
                let groups = self
                    .groups
                    .keys()
                    .filter(|(c, _)| *c == cluster)
                    .map(|(_, g)| g.clone())
                    .collect();
                let _ = reply.send(groups);
            }
            ShardRequest::ClusterStats { cluster, reply } => {
                let stats = ShardClusterStats {
                    groups: self.groups.keys().filter(|(c, _)| *c == cluster).count(),
                    dropped_offsets: self.dropped.get(&cluster).copied().unwrap_or(0),
                };
                let _ = reply.send(stats);
            }
            ShardRequest::SweepExpired { cutoff_ms } => {
                self.sweep_expired(cutoff_ms);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn store_consumer_offset(
        &mut self,
        cluster: String,
        group: String,
        topic: String,
        partition: i32,
        offset: i64,
        timestamp: i64,
        order: Option<i64>,
    ) {
        // Lag is captured against whatever LEO is visible right now and is
        // never back-filled by later broker updates.
        let (leo, lag) = match self.broker_offsets.leo(&cluster, &topic, partition) {
            Some(leo) => (leo, (leo - offset).max(0)),
            None => (-1, -1),
        };

        let created = !self.groups.contains_key(&(cluster.clone(), group.clone()));
        let entry = self
            .groups
            .entry((cluster.clone(), group))
            .or_insert_with(|| GroupEntry {
                topics: HashMap::new(),
                last_commit_ms: timestamp,
            });
        let ring = entry
            .topics
            .entry(topic)
            .or_default()
            .entry(partition)
            .or_insert_with(|| OffsetRing::new(self.window_size));

        match ring.offer(offset, timestamp, lag, leo, order, self.min_distance_ms) {
            PushOutcome::Stored { .. } => {
                entry.last_commit_ms = entry.last_commit_ms.max(timestamp);
                OFFSETS_STORED_TOTAL.with_label_values(&[&self.label]).inc();
            }
            PushOutcome::OutOfOrder => {
                OFFSETS_DROPPED_TOTAL
                    .with_label_values(&[&self.label, "out_of_order"])
                    .inc();
                *self.dropped.entry(cluster).or_insert(0) += 1;
            }
            PushOutcome::Duplicate => {
                OFFSETS_DROPPED_TOTAL
                    .with_label_values(&[&self.label, "duplicate"])
                    .inc();
                *self.dropped.entry(cluster).or_insert(0) += 1;
            }
        }

        if created {
            self.publish_group_gauge();
        }
    }

    fn snapshot_group(&self, cluster: &str, group: &str) -> Option<ConsumerSnapshot> {
        let entry = self.groups.get(&(cluster.to_string(), group.to_string()))?;
        let mut snapshot = ConsumerSnapshot {
            cluster: cluster.to_string(),
            group: group.to_string(),
            topics: HashMap::new(),
        };
        for (topic, partitions) in &entry.topics {
            let windows = partitions
                .iter()
                .map(|(partition, ring)| (*partition, ring.snapshot()))
                .collect();
            snapshot.topics.insert(topic.clone(), windows);
        }
        Some(snapshot)
    }

    fn delete_topic(&mut self, cluster: &str, topic: &str) {
        for ((c, _), entry) in self.groups.iter_mut() {
            if c == cluster {
                entry.topics.remove(topic);
            }
        }
        // A group left with no rings is reclaimed.
        self.groups
            .retain(|(c, _), entry| c != cluster || !entry.topics.is_empty());
        self.publish_group_gauge();
    }

    fn sweep_expired(&mut self, cutoff_ms: i64) {
        let before = self.groups.len();
        self.groups.retain(|_, entry| entry.last_commit_ms >= cutoff_ms);
        let expired = before - self.groups.len();
        if expired > 0 {
            debug!(shard = self.id, expired, "swept expired groups");
            GROUPS_EXPIRED_TOTAL
                .with_label_values(&[&self.label])
                .inc_by(expired as u64);
            self.publish_group_gauge();
        }
    }

    fn publish_group_gauge(&self) {
        GROUPS_OWNED
            .with_label_values(&[&self.label])
            .set(self.groups.len() as i64);
    }
}
