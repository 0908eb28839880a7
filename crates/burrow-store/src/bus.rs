//! Message bus: request routing between producers and store workers.
//!
//! [`StorageHandle`] is the producer-facing side of the bus. Cluster
//! modules call `store_broker_offset`/`delete_topic`, consumer modules
//! call `store_consumer_offset`/`delete_group`, and the evaluator, the
//! notifier, and the HTTP frontend use the fetch methods. Every handle is
//! a cheap clone routing onto the same bounded per-shard channels.
//!
//! ## Contract
//!
//! - Offset writes are fire-and-forget. A full shard queue drops the write
//!   and counts it; the producer sees `Busy` and may retry with backoff.
//! - Fetches wait up to the configured send timeout for queue space and
//!   then block on a single-use reply channel until the owning worker
//!   responds or the store shuts down.
//! - Ordering holds per (cluster, group): all samples for one group pass
//!   through one shard channel in send order. Nothing is guaranteed across
//!   groups.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use burrow_core::{BurrowError, ClusterStatus, ConsumerSnapshot, Result};
use dashmap::DashMap;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::sync::{mpsc, oneshot, watch};

use crate::broker::BrokerRequest;
use crate::shard::ShardRequest;
use burrow_observability::metrics::{FETCH_TIMEOUTS_TOTAL, OFFSETS_DROPPED_TOTAL};

/// Shard owning a (cluster, group), by stable hash. The same inputs always
/// route to the same shard for a given shard count.
pub fn route_shard(cluster: &str, group: &str, shards: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    cluster.hash(&mut hasher);
    group.hash(&mut hasher);
    (hasher.finish() % shards as u64) as usize
}

/// Cloneable handle onto the store's request channels.
#[derive(Clone)]
pub struct StorageHandle {
    pub(crate) shards: Arc<Vec<mpsc::Sender<ShardRequest>>>,
    pub(crate) broker: mpsc::Sender<BrokerRequest>,
    clusters: Arc<Vec<String>>,
    /// Writes bounced off a full queue, per cluster. Shared by all handle
    /// clones and folded into cluster status fetches.
    queue_full_drops: Arc<DashMap<String, u64>>,
    send_timeout: Duration,
    shutdown: watch::Receiver<bool>,
}

impl StorageHandle {
    pub(crate) fn new(
        shards: Vec<mpsc::Sender<ShardRequest>>,
        broker: mpsc::Sender<BrokerRequest>,
        clusters: Vec<String>,
        send_timeout: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        StorageHandle {
            shards: Arc::new(shards),
            broker,
            clusters: Arc::new(clusters),
            queue_full_drops: Arc::new(DashMap::new()),
            send_timeout,
            shutdown,
        }
    }

    fn count_queue_full_drop(&self, cluster: &str) {
        *self
            .queue_full_drops
            .entry(cluster.to_string())
            .or_insert(0) += 1;
    }

    /// Names of the configured clusters.
    pub fn clusters(&self) -> &[String] {
        &self.clusters
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard that owns the given group.
    pub fn shard_for(&self, cluster: &str, group: &str) -> usize {
        route_shard(cluster, group, self.shards.len())
    }

    fn check_cluster(&self, cluster: &str) -> Result<()> {
        if *self.shutdown.borrow() {
            return Err(BurrowError::ShuttingDown);
        }
        if self.clusters.iter().any(|c| c == cluster) {
            Ok(())
        } else {
            Err(BurrowError::ClusterNotFound(cluster.to_string()))
        }
    }

    // ------------------------------------------------------------------
    // Producer interface (cluster and consumer modules)
    // ------------------------------------------------------------------

    /// Record a broker LEO observation. Fire-and-forget; a full queue
    /// drops the update.
    pub fn store_broker_offset(
        &self,
        cluster: &str,
        topic: &str,
        partition: i32,
        offset: i64,
        timestamp: i64,
    ) -> Result<()> {
        self.check_cluster(cluster)?;
        let req = BrokerRequest::StoreBrokerOffset {
            cluster: cluster.to_string(),
            topic: topic.to_string(),
            partition,
            offset,
            timestamp,
        };
        match self.broker.try_send(req) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                OFFSETS_DROPPED_TOTAL
                    .with_label_values(&["broker", "queue_full"])
                    .inc();
                self.count_queue_full_drop(cluster);
                Err(BurrowError::Busy)
            }
            Err(TrySendError::Closed(_)) => Err(BurrowError::ShuttingDown),
        }
    }

    /// Record a consumer offset commit. Fire-and-forget; a full shard
    /// queue drops the sample and counts it against the shard.
    #[allow(clippy::too_many_arguments)]
    pub fn store_consumer_offset(
        &self,
        cluster: &str,
        group: &str,
        topic: &str,
        partition: i32,
        offset: i64,
        timestamp: i64,
        order: Option<i64>,
    ) -> Result<()> {
        self.check_cluster(cluster)?;
        let shard = self.shard_for(cluster, group);
        let req = ShardRequest::StoreConsumerOffset {
            cluster: cluster.to_string(),
            group: group.to_string(),
            topic: topic.to_string(),
            partition,
            offset,
            timestamp,
            order,
        };
        match self.shards[shard].try_send(req) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                OFFSETS_DROPPED_TOTAL
                    .with_label_values(&[&shard.to_string(), "queue_full"])
                    .inc();
                self.count_queue_full_drop(cluster);
                Err(BurrowError::Busy)
            }
            Err(TrySendError::Closed(_)) => Err(BurrowError::ShuttingDown),
        }
    }

    /// Remove a group from the store.
    pub async fn delete_group(&self, cluster: &str, group: &str) -> Result<()> {
        self.check_cluster(cluster)?;
        let shard = self.shard_for(cluster, group);
        let (reply, rx) = oneshot::channel();
        self.send_to_shard(
            shard,
            ShardRequest::DeleteGroup {
                cluster: cluster.to_string(),
                group: group.to_string(),
                reply,
            },
        )
        .await?;
        match rx.await {
            Ok(true) => Ok(()),
            Ok(false) => Err(BurrowError::GroupNotFound {
                cluster: cluster.to_string(),
                group: group.to_string(),
            }),
            Err(_) => Err(BurrowError::ShuttingDown),
        }
    }

    /// Remove a topic: clears its broker offsets and every group ring
    /// referencing it, across all shards.
    pub async fn delete_topic(&self, cluster: &str, topic: &str) -> Result<()> {
        self.check_cluster(cluster)?;
        self.send_to_broker(BrokerRequest::DeleteTopic {
            cluster: cluster.to_string(),
            topic: topic.to_string(),
        })
        .await?;
        for shard in 0..self.shards.len() {
            self.send_to_shard(
                shard,
                ShardRequest::DeleteTopic {
                    cluster: cluster.to_string(),
                    topic: topic.to_string(),
                },
            )
            .await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Fetch interface (evaluator, notifier, HTTP)
    // ------------------------------------------------------------------

    /// Copy-out snapshot of one group's rings.
    pub async fn fetch_consumer(&self, cluster: &str, group: &str) -> Result<ConsumerSnapshot> {
        self.check_cluster(cluster)?;
        let shard = self.shard_for(cluster, group);
        let (reply, rx) = oneshot::channel();
        self.send_to_shard(
            shard,
            ShardRequest::FetchConsumer {
                cluster: cluster.to_string(),
                group: group.to_string(),
                reply,
            },
        )
        .await?;
        match rx.await {
            Ok(Some(snapshot)) => Ok(snapshot),
            Ok(None) => Err(BurrowError::GroupNotFound {
                cluster: cluster.to_string(),
                group: group.to_string(),
            }),
            Err(_) => Err(BurrowError::ShuttingDown),
        }
    }

    /// All groups known for a cluster, merged across shards.
    pub async fn fetch_group_list(&self, cluster: &str) -> Result<Vec<String>> {
        self.check_cluster(cluster)?;
        let mut receivers = Vec::with_capacity(self.shards.len());
        for shard in 0..self.shards.len() {
            let (reply, rx) = oneshot::channel();
            self.send_to_shard(
                shard,
                ShardRequest::GroupList {
                    cluster: cluster.to_string(),
                    reply,
                },
            )
            .await?;
            receivers.push(rx);
        }
        let mut groups = Vec::new();
        for rx in receivers {
            groups.extend(rx.await.map_err(|_| BurrowError::ShuttingDown)?);
        }
        groups.sort_unstable();
        Ok(groups)
    }

    /// Groups committing offsets on the given topic.
    pub async fn fetch_consumers_for_topic(
        &self,
        cluster: &str,
        topic: &str,
    ) -> Result<Vec<String>> {
        self.check_cluster(cluster)?;
        let mut receivers = Vec::with_capacity(self.shards.len());
        for shard in 0..self.shards.len() {
            let (reply, rx) = oneshot::channel();
            self.send_to_shard(
                shard,
                ShardRequest::GroupsForTopic {
                    cluster: cluster.to_string(),
                    topic: topic.to_string(),
                    reply,
                },
            )
            .await?;
            receivers.push(rx);
        }
        let mut consumers = Vec::new();
        for rx in receivers {
            consumers.extend(rx.await.map_err(|_| BurrowError::ShuttingDown)?);
        }
        consumers.sort_unstable();
        Ok(consumers)
    }

    /// Topic names with at least one reported broker offset.
    pub async fn fetch_topic_list(&self, cluster: &str) -> Result<Vec<String>> {
        self.check_cluster(cluster)?;
        let (reply, rx) = oneshot::channel();
        self.send_to_broker(BrokerRequest::TopicList {
            cluster: cluster.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| BurrowError::ShuttingDown)
    }

    /// LEOs for one topic as an array indexed by partition.
    pub async fn fetch_topic_offsets(&self, cluster: &str, topic: &str) -> Result<Vec<i64>> {
        self.check_cluster(cluster)?;
        let (reply, rx) = oneshot::channel();
        self.send_to_broker(BrokerRequest::PartitionOffsets {
            cluster: cluster.to_string(),
            topic: topic.to_string(),
            reply,
        })
        .await?;
        match rx.await {
            Ok(Some(offsets)) => Ok(offsets),
            Ok(None) => Err(BurrowError::TopicNotFound {
                cluster: cluster.to_string(),
                topic: topic.to_string(),
            }),
            Err(_) => Err(BurrowError::ShuttingDown),
        }
    }

    /// Aggregate counts for one cluster.
    pub async fn fetch_cluster_status(&self, cluster: &str) -> Result<ClusterStatus> {
        self.check_cluster(cluster)?;
        let (reply, rx) = oneshot::channel();
        self.send_to_broker(BrokerRequest::ClusterCounts {
            cluster: cluster.to_string(),
            reply,
        })
        .await?;
        let (topics, partitions) = rx.await.map_err(|_| BurrowError::ShuttingDown)?;

        let mut groups = 0usize;
        let mut dropped_offsets = self
            .queue_full_drops
            .get(cluster)
            .map(|count| *count)
            .unwrap_or(0);
        let mut receivers = Vec::with_capacity(self.shards.len());
        for shard in 0..self.shards.len() {
            let (reply, rx) = oneshot::channel();
            self.send_to_shard(
                shard,
                ShardRequest::ClusterStats {
                    cluster: cluster.to_string(),
                    reply,
                },
            )
            .await?;
            receivers.push(rx);
        }
        for rx in receivers {
            let stats = rx.await.map_err(|_| BurrowError::ShuttingDown)?;
            groups += stats.groups;
            dropped_offsets += stats.dropped_offsets;
        }

        Ok(ClusterStatus {
            cluster: cluster.to_string(),
            topics,
            partitions,
            groups,
            dropped_offsets,
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn send_to_shard(&self, shard: usize, req: ShardRequest) -> Result<()> {
        match self.shards[shard].send_timeout(req, self.send_timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => {
                FETCH_TIMEOUTS_TOTAL.inc();
                Err(BurrowError::Busy)
            }
            Err(SendTimeoutError::Closed(_)) => Err(BurrowError::ShuttingDown),
        }
    }

    async fn send_to_broker(&self, req: BrokerRequest) -> Result<()> {
        match self.broker.send_timeout(req, self.send_timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => {
                FETCH_TIMEOUTS_TOTAL.inc();
                Err(BurrowError::Busy)
            }
            Err(SendTimeoutError::Closed(_)) => Err(BurrowError::ShuttingDown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_shard_is_stable() {
        let first = route_shard("local", "billing", 20);
        for _ in 0..100 {
            assert_eq!(route_shard("local", "billing", 20), first);
        }
    }

    #[test]
    fn test_route_shard_in_range() {
        for shards in 1..=32 {
            for group in ["a", "billing", "console-consumer-1234", ""] {
                assert!(route_shard("local", group, shards) < shards);
            }
        }
    }

    #[test]
    fn test_route_shard_spreads_groups() {
        let shards = 4;
        let mut seen = std::collections::HashSet::new();
        for i in 0..100 {
            seen.insert(route_shard("local", &format!("group-{}", i), shards));
        }
        assert!(seen.len() > 1, "all groups routed to a single shard");
    }
}
