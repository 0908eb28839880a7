//! Evaluator service: snapshot fetching plus a short-lived result cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use burrow_core::{BurrowConfig, GroupStatus, Result};
use burrow_store::StorageHandle;
use tokio::sync::RwLock;
use tracing::debug;

use crate::rules::{evaluate, RuleConfig};
use burrow_observability::metrics::{EVALUATIONS_TOTAL, EVALUATION_CACHE_HITS_TOTAL};

struct CachedStatus {
    computed_at: Instant,
    status: GroupStatus,
}

/// Evaluates consumer groups against the sliding-window rules.
///
/// The evaluator holds no locks while classifying: it asks the owning
/// shard for a copy-out snapshot and runs the pure rule engine over it.
/// Results are cached for the configured sampling cadence so the notifier
/// tick and HTTP queries arriving together do not redo the same work; a
/// cadence of zero disables the cache.
pub struct Evaluator {
    storage: StorageHandle,
    rules: RuleConfig,
    cache_ttl: Duration,
    cache: RwLock<HashMap<(String, String), CachedStatus>>,
}

impl Evaluator {
    pub fn new(storage: StorageHandle, config: &BurrowConfig) -> Self {
        let rules = RuleConfig {
            window_size: config.store.window_size,
            min_distance_ms: config.store.min_distance_ms(),
            stop_threshold_ms: config.store.expire_group_ms() / 2,
        };
        Evaluator {
            storage,
            rules,
            cache_ttl: Duration::from_secs(config.evaluator.intervals_secs),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    /// Current status of a group, classified from a fresh snapshot unless
    /// a result younger than the sampling cadence is cached.
    pub async fn group_status(&self, cluster: &str, group: &str) -> Result<GroupStatus> {
        let key = (cluster.to_string(), group.to_string());

        if !self.cache_ttl.is_zero() {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&key) {
                if cached.computed_at.elapsed() < self.cache_ttl {
                    EVALUATION_CACHE_HITS_TOTAL.inc();
                    return Ok(cached.status.clone());
                }
            }
        }

        let snapshot = self.storage.fetch_consumer(cluster, group).await?;
        let status = evaluate(&snapshot, &self.rules);
        EVALUATIONS_TOTAL
            .with_label_values(&[status.status.as_str()])
            .inc();
        debug!(
            cluster,
            group,
            status = %status.status,
            partitions = status.partitions.len(),
            total_lag = status.total_lag,
            "evaluated group"
        );

        if !self.cache_ttl.is_zero() {
            let mut cache = self.cache.write().await;
            cache.insert(
                key,
                CachedStatus {
                    computed_at: Instant::now(),
                    status: status.clone(),
                },
            );
        }
        Ok(status)
    }

    /// Drop any cached result for a group, e.g. after it was deleted.
    pub async fn invalidate(&self, cluster: &str, group: &str) {
        let mut cache = self.cache.write().await;
        cache.remove(&(cluster.to_string(), group.to_string()));
    }
}
