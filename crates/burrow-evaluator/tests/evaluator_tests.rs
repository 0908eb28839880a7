//! Integration tests for the evaluator service against a live store.

use burrow_core::{BurrowConfig, BurrowError, ClusterConfig, EvaluatorConfig, Severity, StoreConfig};
use burrow_evaluator::Evaluator;
use burrow_store::OffsetStore;

fn test_config(cache_secs: u64) -> BurrowConfig {
    BurrowConfig {
        store: StoreConfig {
            workers: 2,
            queue_depth: 32,
            queue_send_timeout_secs: 1,
            min_distance_secs: 1,
            window_size: 15,
            // Small expiry so the stop threshold (half of this) is
            // reachable inside a one-minute window.
            expire_group_secs: 100,
            sweep_interval_secs: 3_600,
        },
        evaluator: EvaluatorConfig {
            intervals_secs: cache_secs,
        },
        clusters: vec![ClusterConfig {
            name: "local".to_string(),
            servers: vec![],
        }],
        ..Default::default()
    }
}

async fn feed_commits(
    handle: &burrow_store::StorageHandle,
    group: &str,
    offsets: &[i64],
    step_ms: i64,
) {
    for (i, offset) in offsets.iter().enumerate() {
        handle
            .store_consumer_offset(
                "local",
                group,
                "orders",
                0,
                *offset,
                step_ms * (i as i64 + 1),
                None,
            )
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    // Let the shard drain.
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
}

#[tokio::test]
async fn test_stopped_group_reported_err() {
    let config = test_config(0);
    let mut store = OffsetStore::new(&config);
    store.start();
    let handle = store.handle();
    let evaluator = Evaluator::new(handle.clone(), &config);

    handle
        .store_broker_offset("local", "orders", 0, 100, 1_000)
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    // Fourteen frozen commits against LEO 100...
    feed_commits(&handle, "billing", &[50; 14], 4_000).await;
    // ...then the broker moves on before the last commit arrives.
    handle
        .store_broker_offset("local", "orders", 0, 200, 59_000)
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    handle
        .store_consumer_offset("local", "billing", "orders", 0, 50, 60_000, None)
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;

    let status = evaluator.group_status("local", "billing").await.unwrap();
    assert_eq!(status.status, Severity::Err);
    assert_eq!(status.partitions.len(), 1);
    assert_eq!(
        status.partitions[0].status,
        burrow_core::PartitionStatusCode::Stop
    );

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_healthy_group_reported_ok() {
    let config = test_config(0);
    let mut store = OffsetStore::new(&config);
    store.start();
    let handle = store.handle();
    let evaluator = Evaluator::new(handle.clone(), &config);

    for i in 0..15i64 {
        handle
            .store_broker_offset("local", "orders", 0, 200 + 10 * i, 4_000 * (i + 1) - 1)
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        handle
            .store_consumer_offset("local", "billing", "orders", 0, 100 + 10 * i, 4_000 * (i + 1), None)
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;

    let status = evaluator.group_status("local", "billing").await.unwrap();
    assert_eq!(status.status, Severity::Ok);
    assert_eq!(status.total_lag, 100);

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_group_is_not_found() {
    let config = test_config(0);
    let mut store = OffsetStore::new(&config);
    store.start();
    let evaluator = Evaluator::new(store.handle(), &config);

    assert!(matches!(
        evaluator.group_status("local", "ghost").await,
        Err(BurrowError::GroupNotFound { .. })
    ));
    assert!(matches!(
        evaluator.group_status("elsewhere", "ghost").await,
        Err(BurrowError::ClusterNotFound(_))
    ));

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_result_cache_serves_repeat_queries() {
    let config = test_config(60);
    let mut store = OffsetStore::new(&config);
    store.start();
    let handle = store.handle();
    let evaluator = Evaluator::new(handle.clone(), &config);

    feed_commits(&handle, "billing", &[100, 110, 120], 4_000).await;

    let first = evaluator.group_status("local", "billing").await.unwrap();

    // Remove the group out from under the cache: a cached evaluator keeps
    // answering inside the sampling cadence.
    handle.delete_group("local", "billing").await.unwrap();
    let second = evaluator.group_status("local", "billing").await.unwrap();
    assert_eq!(first, second);

    // Invalidation forces a refetch, which now reports the deletion.
    evaluator.invalidate("local", "billing").await;
    assert!(matches!(
        evaluator.group_status("local", "billing").await,
        Err(BurrowError::GroupNotFound { .. })
    ));

    store.stop().await.unwrap();
}
