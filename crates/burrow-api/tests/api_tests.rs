//! Integration tests for the HTTP frontend.
//!
//! A real store and evaluator back the router; requests go through
//! `tower::ServiceExt::oneshot` without binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use burrow_api::{create_router, AppState};
use burrow_core::{BurrowConfig, ClusterConfig, EvaluatorConfig, StoreConfig};
use burrow_evaluator::Evaluator;
use burrow_store::OffsetStore;

fn test_config() -> BurrowConfig {
    BurrowConfig {
        store: StoreConfig {
            workers: 2,
            queue_depth: 32,
            queue_send_timeout_secs: 1,
            min_distance_secs: 1,
            window_size: 15,
            expire_group_secs: 604_800,
            sweep_interval_secs: 3_600,
        },
        evaluator: EvaluatorConfig { intervals_secs: 0 },
        clusters: vec![ClusterConfig {
            name: "local".to_string(),
            servers: vec!["kafka-1:9092".to_string()],
        }],
        ..Default::default()
    }
}

async fn test_app() -> (OffsetStore, axum::Router) {
    let config = test_config();
    let mut store = OffsetStore::new(&config);
    store.start();
    let handle = store.handle();
    let evaluator = Arc::new(Evaluator::new(handle.clone(), &config));

    let state = AppState {
        storage: handle,
        evaluator,
        clusters: Arc::new(config.clusters.clone()),
    };
    let router = create_router(state, &config.http);
    (store, router)
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

/// Seed a healthy group: steady progress, constant lag 100.
async fn seed_healthy(handle: &burrow_store::StorageHandle) {
    for i in 0..15i64 {
        handle
            .store_broker_offset("local", "orders", 0, 200 + 10 * i, 4_000 * (i + 1) - 1)
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        handle
            .store_consumer_offset(
                "local",
                "billing",
                "orders",
                0,
                100 + 10 * i,
                4_000 * (i + 1),
                None,
            )
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
}

/// Seed a stalled group: frozen offset with outstanding lag.
async fn seed_stalled(handle: &burrow_store::StorageHandle) {
    handle
        .store_broker_offset("local", "events", 0, 100, 1_000)
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    for i in 1..=15i64 {
        handle
            .store_consumer_offset("local", "audit", "events", 0, 80, 4_000 * i, None)
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
}

#[tokio::test]
async fn test_cluster_list_envelope() {
    let (mut store, app) = test_app().await;

    let (status, json) = get_json(&app, "/v3/kafka").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["error"], false);
    assert_eq!(json["message"], "cluster list returned");
    assert_eq!(json["clusters"], serde_json::json!(["local"]));
    assert_eq!(json["request"]["uri"], "/v3/kafka");
    assert!(json["request"]["host"].is_string());

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_cluster_detail() {
    let (mut store, app) = test_app().await;
    seed_healthy(&store.handle()).await;

    let (status, json) = get_json(&app, "/v3/kafka/local").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["module"]["name"], "local");
    assert_eq!(json["module"]["servers"][0], "kafka-1:9092");
    assert_eq!(json["status"]["topics"], 1);
    assert_eq!(json["status"]["groups"], 1);
    assert_eq!(json["status"]["dropped_offsets"], 0);

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_cluster_is_404_envelope() {
    let (mut store, app) = test_app().await;

    let (status, json) = get_json(&app, "/v3/kafka/nope/consumer").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], true);
    assert_eq!(json["result"], serde_json::json!({}));

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_path_is_invalid_request_type() {
    let (mut store, app) = test_app().await;

    let (status, json) = get_json(&app, "/v2/zookeeper").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], true);
    assert_eq!(json["message"], "invalid request type");
    assert_eq!(json["result"], serde_json::json!({}));

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_topic_endpoints() {
    let (mut store, app) = test_app().await;
    seed_healthy(&store.handle()).await;

    let (status, json) = get_json(&app, "/v3/kafka/local/topic").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["topics"], serde_json::json!(["orders"]));

    let (status, json) = get_json(&app, "/v3/kafka/local/topic/orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["offsets"], serde_json::json!([340]));

    let (status, json) = get_json(&app, "/v3/kafka/local/topic/orders/consumers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["consumers"], serde_json::json!(["billing"]));

    let (status, _) = get_json(&app, "/v3/kafka/local/topic/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_consumer_detail_returns_windows() {
    let (mut store, app) = test_app().await;
    seed_healthy(&store.handle()).await;

    let (status, json) = get_json(&app, "/v3/kafka/local/consumer/billing").await;
    assert_eq!(status, StatusCode::OK);
    let windows = json["topics"]["orders"].as_array().unwrap();
    assert_eq!(windows.len(), 1);
    let window = windows[0].as_array().unwrap();
    assert_eq!(window.len(), 15);
    assert_eq!(window[14]["offset"], 240);
    assert_eq!(window[14]["lag"], 100);

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_status_omits_partitions_when_ok() {
    let (mut store, app) = test_app().await;
    seed_healthy(&store.handle()).await;

    let (status, json) = get_json(&app, "/v3/kafka/local/consumer/billing/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"]["status"], "OK");
    assert_eq!(json["status"]["partitions"].as_array().unwrap().len(), 0);
    assert_eq!(json["status"]["total_lag"], 100);

    // The lag endpoint always carries the full partition list.
    let (_, json) = get_json(&app, "/v3/kafka/local/consumer/billing/lag").await;
    assert_eq!(json["status"]["partitions"].as_array().unwrap().len(), 1);

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_stalled_group_status() {
    let (mut store, app) = test_app().await;
    seed_stalled(&store.handle()).await;

    let (status, json) = get_json(&app, "/v3/kafka/local/consumer/audit/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"]["status"], "ERR");
    let partitions = json["status"]["partitions"].as_array().unwrap();
    assert_eq!(partitions.len(), 1);
    assert_eq!(partitions[0]["status"], "STALL");
    assert_eq!(partitions[0]["current_lag"], 20);

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_delete_consumer() {
    let (mut store, app) = test_app().await;
    seed_healthy(&store.handle()).await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/v3/kafka/local/consumer/billing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, json) = get_json(&app, "/v3/kafka/local/consumer/billing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], true);

    store.stop().await.unwrap();
}

#[tokio::test]
async fn test_health_and_admin() {
    let (mut store, app) = test_app().await;

    let (status, json) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/burrow/admin")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"GOOD");

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    store.stop().await.unwrap();
}
