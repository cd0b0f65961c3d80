//! Integration tests for the checkout delivery-dates client.
//!
//! The client talks to a real backend on a local port, which in turn talks to
//! a local upstream. Retry delays are shortened; the code path is the same.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use chrono::NaiveDate;
use dutchned_checkout::{
    CheckoutConfig, DatePicker, DeliveryDatesClient, PickerError, QueryError, RetryPolicy,
};
use dutchned_integration_tests::{
    TestApp, spawn_flaky_upstream, spawn_server, spawn_upstream, test_config,
};
use serde_json::{Value, json};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
    }
}

/// Backend on a local port in front of `upstream`.
async fn spawn_backend(upstream: &str) -> String {
    let app = TestApp::new(test_config(upstream, Duration::from_secs(5)));
    let addr = spawn_server(app.router).await;
    format!("http://{addr}")
}

fn client(backend_url: &str) -> DeliveryDatesClient {
    let config = CheckoutConfig::new(backend_url).unwrap().with_retry(fast_retry());
    DeliveryDatesClient::new(config).unwrap()
}

/// Stand-in backend answering every request with `status` and `body`.
async fn spawn_fixed_backend(status: StatusCode, body: Value) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let router = Router::new().route(
        "/api/delivery-dates/available",
        get(move || {
            let body = body.clone();
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (status, axum::Json(body))
            }
        }),
    );
    let addr = spawn_server(router).await;
    (format!("http://{addr}"), calls)
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// =============================================================================
// Caching
// =============================================================================

#[tokio::test]
async fn test_fresh_data_is_served_from_cache() {
    let (upstream, calls) = spawn_upstream(json!([{"date": "2024-05-01"}])).await;
    let client = client(&spawn_backend(&upstream).await);
    let key = client.key(Some("1012AB"), Some("NL"));

    let first = client.fetch(&key).await.unwrap();
    let second = client.fetch(&key).await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let state = client.state(&key).await;
    assert!(state.data.is_some());
    assert!(!state.is_loading);
    assert!(!state.is_fetching);
    assert!(!state.is_stale);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_keys_are_cached_separately() {
    let (upstream, calls) = spawn_upstream(json!([{"date": "2024-05-01"}])).await;
    let client = client(&spawn_backend(&upstream).await);

    client.fetch(&client.key(Some("1012AB"), None)).await.unwrap();
    client.fetch(&client.key(Some("3511AX"), None)).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stale_data_is_refetched() {
    let (upstream, calls) = spawn_upstream(json!([{"date": "2024-05-01"}])).await;
    let backend = spawn_backend(&upstream).await;
    let config = CheckoutConfig::new(&backend)
        .unwrap()
        .with_retry(fast_retry())
        .with_stale_time(Duration::ZERO);
    let client = DeliveryDatesClient::new(config).unwrap();
    let key = client.key(None, None);

    client.fetch(&key).await.unwrap();
    assert!(client.state(&key).await.is_stale);
    client.fetch(&key).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalidate_and_refetch_go_to_network() {
    let (upstream, calls) = spawn_upstream(json!([{"date": "2024-05-01"}])).await;
    let client = client(&spawn_backend(&upstream).await);
    let key = client.key(Some("1012AB"), Some("NL"));

    client.fetch(&key).await.unwrap();

    client.invalidate(&key).await;
    let state = client.state(&key).await;
    assert!(state.is_stale);
    assert!(state.data.is_some(), "invalidated data stays visible");

    client.fetch(&key).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    client.refetch(&key).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    client.invalidate_all().await;
    assert!(client.state(&key).await.is_stale);
}

#[tokio::test]
async fn test_prefetch_warms_cache() {
    let (upstream, calls) = spawn_upstream(json!([{"date": "2024-05-01"}])).await;
    let client = client(&spawn_backend(&upstream).await);
    let key = client.key(Some("1012AB"), None);

    client.prefetch(key.clone()).await.unwrap();
    assert!(client.state(&key).await.data.is_some());

    client.fetch(&key).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Retries
// =============================================================================

#[tokio::test]
async fn test_server_errors_are_retried() {
    let (upstream, calls) = spawn_flaky_upstream(json!([{"date": "2024-05-01"}]), 2).await;
    let client = client(&spawn_backend(&upstream).await);
    let key = client.key(None, None);

    let dates = client.fetch(&key).await.unwrap();

    assert_eq!(dates.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(client.state(&key).await.error.is_none());
}

#[tokio::test]
async fn test_retries_stop_after_limit() {
    let (upstream, calls) = spawn_flaky_upstream(json!([]), usize::MAX).await;
    let client = client(&spawn_backend(&upstream).await);
    let key = client.key(None, None);

    let err = client.fetch(&key).await.unwrap_err();

    assert!(matches!(*err, QueryError::Status { status: 502, .. }));
    assert_eq!(err.error_key(), Some("upstream_error"));
    // One attempt plus three retries
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    let state = client.state(&key).await;
    assert!(state.error.is_some());
    assert!(state.data.is_none());
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let (backend, calls) = spawn_fixed_backend(
        StatusCode::BAD_REQUEST,
        json!({"success": false, "data": [], "error": "validation_error", "message": "bad"}),
    )
    .await;
    let client = client(&backend);

    let err = client.fetch(&client.key(None, None)).await.unwrap_err();

    assert!(matches!(*err, QueryError::Status { status: 400, .. }));
    assert_eq!(err.error_key(), Some("validation_error"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_an_error() {
    let (backend, calls) = spawn_fixed_backend(
        StatusCode::OK,
        json!({"success": false, "data": [], "error": "upstream_error", "message": "down"}),
    )
    .await;
    let client = client(&backend);

    let err = client.fetch(&client.key(None, None)).await.unwrap_err();

    assert!(matches!(*err, QueryError::Api { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Picker
// =============================================================================

#[tokio::test]
async fn test_picker_loads_and_disables_gaps() {
    let (upstream, _) = spawn_upstream(json!([
        {"date": "2024-05-01"},
        {"date": "2024-05-03"}
    ]))
    .await;
    let client = client(&spawn_backend(&upstream).await);
    let key = client.key(Some("1012AB"), Some("NL"));

    let mut picker = DatePicker::new();
    assert!(picker.is_loading());
    picker.load(&client, &key).await;

    assert!(!picker.is_loading());
    assert_eq!(picker.error(), None);
    assert_eq!(picker.dates().len(), 2);
    assert!(picker.disabled().contains(date("2024-05-02")));
    assert!(picker.disabled().contains(date("2024-04-30")));
    assert!(picker.disabled().contains(date("2024-05-04")));
    assert!(!picker.disabled().contains(date("2024-05-01")));
}

#[tokio::test]
async fn test_picker_reports_loading_failure() {
    let (backend, _) = spawn_fixed_backend(
        StatusCode::BAD_REQUEST,
        json!({"success": false, "data": [], "error": "validation_error", "message": "bad"}),
    )
    .await;
    let client = client(&backend);
    let key = client.key(None, None);

    let mut picker = DatePicker::new();
    picker.load(&client, &key).await;

    assert_eq!(picker.error(), Some(PickerError::LoadingFailed));
    assert_eq!(picker.error().unwrap().key(), "loading_failed");
}
