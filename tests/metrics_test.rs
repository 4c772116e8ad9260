//! Tests for metrics emitted by the cache and the upstream client.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use discourse_relay::cache::{KeyValueStore, MemoryStore, StoreError};
use discourse_relay::{ForumApi, ForumClient, Relay, telemetry};

// ============================================================================
// Snapshot helpers
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

/// Whether a counter `name` carries `label = value`.
fn has_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> bool {
    snapshot.iter().any(|(key, _, _, _)| {
        key.key().name() == name
            && key
                .key()
                .labels()
                .any(|l| l.key() == label && l.value() == value)
    })
}

/// Runs `fut` within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` keeps the sync `with_local_recorder` closure on the
/// current thread while `block_on` drives the inner async work.
fn recorded<F: Future>(fut: F) -> (F::Output, SnapshotVec) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let output = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut))
    });
    (output, snapshotter.snapshot().into_vec())
}

/// A store that refuses every command.
struct DownStore;

#[async_trait]
impl KeyValueStore for DownStore {
    fn name(&self) -> &str {
        "down"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn upstream_request_records_counter_and_histogram() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/t/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .mount(&server)
        .await;
    let client = ForumClient::new(server.uri()).unwrap();

    let (result, snapshot) = recorded(client.topic("1"));
    assert!(result.is_ok());

    assert_eq!(counter_total(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL), 1);
    assert!(has_label(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "status", "ok"));
    assert!(has_label(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "operation", "topic"));
    assert!(has_histogram(&snapshot, telemetry::UPSTREAM_DURATION_SECONDS));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_upstream_request_is_labelled_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/t/1.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let client = ForumClient::new(server.uri()).unwrap();

    let (result, snapshot) = recorded(client.topic("1"));
    assert!(result.is_err());
    assert!(has_label(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "status", "error"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn cache_hits_and_misses_are_counted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/c/2.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 2 })))
        .mount(&server)
        .await;
    let relay = Relay::builder()
        .base_url(server.uri())
        .store(Arc::new(MemoryStore::new()))
        .build()
        .unwrap();

    let (_, snapshot) = recorded(async {
        for _ in 0..3 {
            relay.category("2").await.unwrap();
        }
    });

    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 2);
    assert_eq!(counter_total(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL), 1);
    assert!(has_label(&snapshot, telemetry::CACHE_HITS_TOTAL, "operation", "category"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn store_errors_are_counted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    let relay = Relay::builder()
        .base_url(server.uri())
        .store(Arc::new(DownStore))
        .build()
        .unwrap();

    let (result, snapshot) = recorded(relay.search("x"));
    assert!(result.is_ok());

    assert_eq!(counter_total(&snapshot, telemetry::STORE_ERRORS_TOTAL), 2);
    assert!(has_label(&snapshot, telemetry::STORE_ERRORS_TOTAL, "op", "get"));
    assert!(has_label(&snapshot, telemetry::STORE_ERRORS_TOTAL, "op", "set"));
}
