//! Integration tests for DutchNed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dutchned-integration-tests
//! ```
//!
//! No external services are needed: the DutchNed API is replaced by small
//! axum servers on ephemeral local ports, and Admin API writes are captured
//! by [`RecordingSink`] instead of being sent.
//!
//! # Test Categories
//!
//! - `delivery_dates` - Delivery-date routes against a local upstream
//! - `order_webhook` - Signed `orders/create` webhooks and the write-back
//! - `shipping_methods` - Shipping-method and delivery-customization routes
//! - `checkout_query` - Checkout client cache and retries against a live backend

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use dutchned_backend::config::{BackendConfig, DutchNedConfig, ShopifyAdminConfig, WriteQueueConfig};
use dutchned_backend::dutchned::DutchNedClient;
use dutchned_backend::routes;
use dutchned_backend::services::{TaskSink, WriteTask};
use dutchned_backend::state::AppState;
use dutchned_backend::store::InMemoryShippingMethodStore;
use secrecy::SecretString;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

/// Webhook secret shared by the test backend and the signing helpers.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_9f3Kx2Lq7Vb1Zm8Rt4Yw6Nc0";

/// Function id configured on the test backend.
pub const TEST_FUNCTION_ID: &str = "gid://shopify/ShopifyFunction/42";

/// [`TaskSink`] that keeps every submitted task.
#[derive(Default)]
pub struct RecordingSink {
    tasks: Mutex<Vec<WriteTask>>,
}

impl RecordingSink {
    /// Tasks submitted so far.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder of the lock panicked.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn tasks(&self) -> Vec<WriteTask> {
        self.tasks.lock().unwrap().clone()
    }
}

impl TaskSink for RecordingSink {
    #[allow(clippy::unwrap_used)]
    fn submit(&self, task: WriteTask) {
        self.tasks.lock().unwrap().push(task);
    }
}

/// Backend configuration pointing at `upstream_url`.
///
/// # Panics
///
/// Panics if `upstream_url` is not a URL.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_config(upstream_url: &str, timeout: Duration) -> BackendConfig {
    BackendConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        dutchned: DutchNedConfig {
            api_url: Url::parse(upstream_url).unwrap(),
            credentials: SecretString::from("dutchned-shop:s3cr3t-pa55"),
            timeout,
        },
        shopify: ShopifyAdminConfig {
            store: "dutchned-test.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            access_token: SecretString::from("shpat_unused_in_tests"),
            api_secret: SecretString::from(TEST_WEBHOOK_SECRET),
            shipping_function_id: Some(TEST_FUNCTION_ID.to_string()),
        },
        write_queue: WriteQueueConfig {
            capacity: 16,
            rate_per_second: NonZeroU32::MIN,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The backend router with an in-memory store and a recording sink.
pub struct TestApp {
    pub router: Router,
    pub sink: Arc<RecordingSink>,
    pub store: Arc<InMemoryShippingMethodStore>,
}

impl TestApp {
    /// Build the app for `config`.
    ///
    /// # Panics
    ///
    /// Panics if the DutchNed client cannot be built.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn new(config: BackendConfig) -> Self {
        Self::with_store(config, InMemoryShippingMethodStore::new())
    }

    /// Build the app with a pre-filled store.
    ///
    /// # Panics
    ///
    /// Panics if the DutchNed client cannot be built.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn with_store(config: BackendConfig, store: InMemoryShippingMethodStore) -> Self {
        let dutchned = DutchNedClient::new(&config.dutchned).unwrap();
        let sink = Arc::new(RecordingSink::default());
        let store = Arc::new(store);
        let state = AppState::new(config, dutchned, store.clone(), sink.clone());

        Self {
            router: routes::router(state),
            sink,
            store,
        }
    }

    /// Send one request through the router and read the body as JSON
    /// (`Value::Null` for non-JSON bodies).
    ///
    /// # Panics
    ///
    /// Panics if the body cannot be read.
    #[allow(clippy::unwrap_used)]
    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

/// Serve `router` on an ephemeral local port.
///
/// # Panics
///
/// Panics if no port can be bound.
#[allow(clippy::unwrap_used)]
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Upstream that answers every request with `payload` and counts calls.
pub async fn spawn_upstream(payload: Value) -> (String, Arc<AtomicUsize>) {
    spawn_flaky_upstream(payload, 0).await
}

/// Upstream that answers 500 to the first `failures` requests, then
/// `payload`.
pub async fn spawn_flaky_upstream(payload: Value, failures: usize) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let router = Router::new().route(
        "/delivery-dates",
        get(move || {
            let payload = payload.clone();
            let counter = counter.clone();
            async move {
                let call = counter.fetch_add(1, Ordering::SeqCst);
                if call < failures {
                    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(Value::Null))
                } else {
                    (StatusCode::OK, axum::Json(payload))
                }
            }
        }),
    );

    let addr = spawn_server(router).await;
    (format!("http://{addr}/delivery-dates"), calls)
}

/// Upstream that accepts connections and never answers.
///
/// # Panics
///
/// Panics if no port can be bound.
#[allow(clippy::unwrap_used)]
pub async fn spawn_silent_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });
    format!("http://{addr}/delivery-dates")
}
