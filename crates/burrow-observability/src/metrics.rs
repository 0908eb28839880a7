use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry};
use std::sync::Once;

static INIT: Once = Once::new();

lazy_static! {
    /// Global Prometheus metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Offset Store Metrics
    // ============================================================================

    /// Consumer offset samples accepted into a ring
    pub static ref OFFSETS_STORED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("burrow_offsets_stored_total", "Consumer offset samples accepted"),
        &["shard"]
    ).expect("metric can be created");

    /// Consumer offset samples dropped, by reason
    /// (out_of_order, duplicate, queue_full)
    pub static ref OFFSETS_DROPPED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("burrow_offsets_dropped_total", "Consumer offset samples dropped"),
        &["shard", "reason"]
    ).expect("metric can be created");

    /// Broker LEO updates applied to the cluster offset table
    pub static ref BROKER_OFFSETS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("burrow_broker_offsets_total", "Broker LEO updates applied"),
        &["cluster"]
    ).expect("metric can be created");

    /// Fetch requests that timed out waiting for shard queue space
    pub static ref FETCH_TIMEOUTS_TOTAL: IntCounter = IntCounter::new(
        "burrow_fetch_timeouts_total",
        "Fetch requests that timed out on a full shard queue"
    ).expect("metric can be created");

    /// Groups currently owned per shard
    pub static ref GROUPS_OWNED: IntGaugeVec = IntGaugeVec::new(
        Opts::new("burrow_groups_owned", "Consumer groups owned per shard"),
        &["shard"]
    ).expect("metric can be created");

    /// Groups removed by the expiry sweeper
    pub static ref GROUPS_EXPIRED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("burrow_groups_expired_total", "Groups removed by the expiry sweeper"),
        &["shard"]
    ).expect("metric can be created");

    // ============================================================================
    // Evaluator Metrics
    // ============================================================================

    /// Group evaluations by resulting status
    pub static ref EVALUATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("burrow_evaluations_total", "Group evaluations by status"),
        &["status"]
    ).expect("metric can be created");

    /// Evaluations answered from the result cache
    pub static ref EVALUATION_CACHE_HITS_TOTAL: IntCounter = IntCounter::new(
        "burrow_evaluation_cache_hits_total",
        "Evaluations answered from the result cache"
    ).expect("metric can be created");

    // ============================================================================
    // Notifier Metrics
    // ============================================================================

    /// Events dispatched per sink, by kind (open, reminder, change, close)
    pub static ref NOTIFIER_EVENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("burrow_notifier_events_total", "Notifier events dispatched"),
        &["sink", "kind"]
    ).expect("metric can be created");

    /// Dispatch failures per sink
    pub static ref NOTIFIER_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("burrow_notifier_failures_total", "Notifier dispatch failures"),
        &["sink"]
    ).expect("metric can be created");
}

/// Initialize metrics registry
/// Can be called multiple times safely (idempotent)
pub fn init() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(OFFSETS_STORED_TOTAL.clone()))
            .expect("offsets_stored_total can be registered");
        REGISTRY
            .register(Box::new(OFFSETS_DROPPED_TOTAL.clone()))
            .expect("offsets_dropped_total can be registered");
        REGISTRY
            .register(Box::new(BROKER_OFFSETS_TOTAL.clone()))
            .expect("broker_offsets_total can be registered");
        REGISTRY
            .register(Box::new(FETCH_TIMEOUTS_TOTAL.clone()))
            .expect("fetch_timeouts_total can be registered");
        REGISTRY
            .register(Box::new(GROUPS_OWNED.clone()))
            .expect("groups_owned can be registered");
        REGISTRY
            .register(Box::new(GROUPS_EXPIRED_TOTAL.clone()))
            .expect("groups_expired_total can be registered");
        REGISTRY
            .register(Box::new(EVALUATIONS_TOTAL.clone()))
            .expect("evaluations_total can be registered");
        REGISTRY
            .register(Box::new(EVALUATION_CACHE_HITS_TOTAL.clone()))
            .expect("evaluation_cache_hits_total can be registered");
        REGISTRY
            .register(Box::new(NOTIFIER_EVENTS_TOTAL.clone()))
            .expect("notifier_events_total can be registered");
        REGISTRY
            .register(Box::new(NOTIFIER_FAILURES_TOTAL.clone()))
            .expect("notifier_failures_total can be registered");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();

        OFFSETS_STORED_TOTAL.with_label_values(&["0"]).inc();
        assert!(OFFSETS_STORED_TOTAL.with_label_values(&["0"]).get() >= 1);
    }

    #[test]
    fn test_drop_reasons_are_independent() {
        init();

        let before = OFFSETS_DROPPED_TOTAL
            .with_label_values(&["1", "duplicate"])
            .get();
        OFFSETS_DROPPED_TOTAL
            .with_label_values(&["1", "duplicate"])
            .inc();
        OFFSETS_DROPPED_TOTAL
            .with_label_values(&["1", "out_of_order"])
            .inc();

        assert_eq!(
            OFFSETS_DROPPED_TOTAL
                .with_label_values(&["1", "duplicate"])
                .get(),
            before + 1
        );
    }
}
