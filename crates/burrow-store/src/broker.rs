//! Broker-offset table and its single writer.
//!
//! The [`BrokerOffsets`] table is the only state shared across workers.
//! Exactly one task, the broker worker, applies writes; shard workers read
//! LEOs lock-free while capturing lag for incoming consumer commits, and
//! topic queries are answered by the worker itself so they observe every
//! update queued before them.

use burrow_core::BrokerOffset;
use dashmap::DashMap;
use std::collections::BTreeSet;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use burrow_observability::metrics::BROKER_OFFSETS_TOTAL;

/// Requests handled by the broker-offset worker.
pub(crate) enum BrokerRequest {
    StoreBrokerOffset {
        cluster: String,
        topic: String,
        partition: i32,
        offset: i64,
        timestamp: i64,
    },
    DeleteTopic {
        cluster: String,
        topic: String,
    },
    TopicList {
        cluster: String,
        reply: oneshot::Sender<Vec<String>>,
    },
    /// LEOs for one topic as an array indexed by partition, -1 for
    /// partitions not yet reported.
    PartitionOffsets {
        cluster: String,
        topic: String,
        reply: oneshot::Sender<Option<Vec<i64>>>,
    },
    /// (topic count, partition count) for one cluster.
    ClusterCounts {
        cluster: String,
        reply: oneshot::Sender<(usize, usize)>,
    },
}

/// Read-mostly table of the latest observed LEO per (cluster, topic,
/// partition). Writes go through the broker worker only.
#[derive(Debug, Default)]
pub struct BrokerOffsets {
    inner: DashMap<(String, String, i32), BrokerOffset>,
}

impl BrokerOffsets {
    pub fn new() -> Self {
        BrokerOffsets {
            inner: DashMap::new(),
        }
    }

    /// Latest LEO for a partition, if the cluster module has reported it.
    pub fn leo(&self, cluster: &str, topic: &str, partition: i32) -> Option<i64> {
        self.inner
            .get(&(cluster.to_string(), topic.to_string(), partition))
            .map(|entry| entry.offset)
    }

    /// Apply an update. A sample replaces the stored one only when its
    /// timestamp is strictly newer, or when the partition is new.
    fn update(&self, cluster: &str, topic: &str, partition: i32, offset: i64, timestamp: i64) -> bool {
        let key = (cluster.to_string(), topic.to_string(), partition);
        match self.inner.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if timestamp > occupied.get().timestamp {
                    occupied.insert(BrokerOffset { offset, timestamp });
                    true
                } else {
                    false
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(BrokerOffset { offset, timestamp });
                true
            }
        }
    }

    fn remove_topic(&self, cluster: &str, topic: &str) {
        self.inner
            .retain(|(c, t, _), _| !(c == cluster && t == topic));
    }

    fn topics(&self, cluster: &str) -> Vec<String> {
        let set: BTreeSet<String> = self
            .inner
            .iter()
            .filter(|entry| entry.key().0 == cluster)
            .map(|entry| entry.key().1.clone())
            .collect();
        set.into_iter().collect()
    }

    fn partition_offsets(&self, cluster: &str, topic: &str) -> Option<Vec<i64>> {
        let mut pairs: Vec<(i32, i64)> = self
            .inner
            .iter()
            .filter(|entry| entry.key().0 == cluster && entry.key().1 == topic)
            .map(|entry| (entry.key().2, entry.value().offset))
            .collect();
        if pairs.is_empty() {
            return None;
        }
        pairs.sort_unstable_by_key(|(partition, _)| *partition);

        let max_partition = pairs.last().map(|(p, _)| *p).unwrap_or(0);
        let mut offsets = vec![-1i64; max_partition as usize + 1];
        for (partition, offset) in pairs {
            offsets[partition as usize] = offset;
        }
        Some(offsets)
    }

    fn counts(&self, cluster: &str) -> (usize, usize) {
        let mut topics = BTreeSet::new();
        let mut partitions = 0usize;
        for entry in self.inner.iter() {
            if entry.key().0 == cluster {
                topics.insert(entry.key().1.clone());
                partitions += 1;
            }
        }
        (topics.len(), partitions)
    }
}

/// The single writer of the broker-offset table.
pub(crate) struct BrokerWorker {
    table: std::sync::Arc<BrokerOffsets>,
    rx: mpsc::Receiver<BrokerRequest>,
    shutdown: watch::Receiver<bool>,
}

impl BrokerWorker {
    pub(crate) fn new(
        table: std::sync::Arc<BrokerOffsets>,
        rx: mpsc::Receiver<BrokerRequest>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        BrokerWorker {
            table,
            rx,
            shutdown,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!("broker offset worker started");
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
        debug!("broker offset worker stopped");
    }

    fn handle(&mut self, req: BrokerRequest) {
        match req {
            BrokerRequest::StoreBrokerOffset {
                cluster,
                topic,
                partition,
                offset,
                timestamp,
            } => {
                if self.table.update(&cluster, &topic, partition, offset, timestamp) {
                    BROKER_OFFSETS_TOTAL.with_label_values(&[&cluster]).inc();
                }
            }
            BrokerRequest::DeleteTopic { cluster, topic } => {
                self.table.remove_topic(&cluster, &topic);
            }
            BrokerRequest::TopicList { cluster, reply } => {
                let _ = reply.send(self.table.topics(&cluster));
            }
            BrokerRequest::PartitionOffsets {
                cluster,
                topic,
                reply,
            } => {
                let _ = reply.send(self.table.partition_offsets(&cluster, &topic));
            }
            BrokerRequest::ClusterCounts { cluster, reply } => {
                let _ = reply.send(self.table.counts(&cluster));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_timestamp_replaces() {
        let table = BrokerOffsets::new();
        assert!(table.update("local", "orders", 0, 100, 1000));
        assert!(table.update("local", "orders", 0, 200, 2000));
        assert_eq!(table.leo("local", "orders", 0), Some(200));
    }

    #[test]
    fn test_stale_timestamp_ignored() {
        let table = BrokerOffsets::new();
        table.update("local", "orders", 0, 200, 2000);
        assert!(!table.update("local", "orders", 0, 100, 1000));
        assert!(!table.update("local", "orders", 0, 300, 2000));
        assert_eq!(table.leo("local", "orders", 0), Some(200));
    }

    #[test]
    fn test_unknown_partition_has_no_leo() {
        let table = BrokerOffsets::new();
        assert_eq!(table.leo("local", "orders", 0), None);
        table.update("local", "orders", 1, 50, 1000);
        assert_eq!(table.leo("local", "orders", 0), None);
        assert_eq!(table.leo("local", "orders", 1), Some(50));
    }

    #[test]
    fn test_partition_offsets_indexed_with_gaps() {
        let table = BrokerOffsets::new();
        table.update("local", "orders", 0, 100, 1000);
        table.update("local", "orders", 2, 300, 1000);
        assert_eq!(
            table.partition_offsets("local", "orders"),
            Some(vec![100, -1, 300])
        );
        assert_eq!(table.partition_offsets("local", "missing"), None);
    }

    #[test]
    fn test_topics_scoped_to_cluster() {
        let table = BrokerOffsets::new();
        table.update("a", "orders", 0, 1, 1);
        table.update("a", "events", 0, 1, 1);
        table.update("b", "payments", 0, 1, 1);
        assert_eq!(table.topics("a"), vec!["events", "orders"]);
        assert_eq!(table.topics("b"), vec!["payments"]);
        assert_eq!(table.counts("a"), (2, 2));
    }

    #[test]
    fn test_remove_topic() {
        let table = BrokerOffsets::new();
        table.update("a", "orders", 0, 1, 1);
        table.update("a", "orders", 1, 1, 1);
        table.update("a", "events", 0, 1, 1);
        table.remove_topic("a", "orders");
        assert_eq!(table.topics("a"), vec!["events"]);
        assert_eq!(table.leo("a", "orders", 0), None);
    }
}
