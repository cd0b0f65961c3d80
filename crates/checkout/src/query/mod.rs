//! Cached delivery-dates query.
//!
//! Results are cached per [`QueryKey`] using `moka`. An entry is served
//! without touching the network while fresh (5 minutes by default) and is
//! evicted once unused for the retention period (10 minutes). Failed fetches
//! are retried with exponential backoff unless the backend rejected the
//! request itself. Fetch errors live in a second cache with the same bounds,
//! and in-flight counters only exist while a fetch for the key is running.

mod cache;

pub use cache::{DeliveryDates, QueryKey};

use std::collections::HashMap;
use std::sync::Arc;

use dutchned_core::DeliveryDatesResponse;
use moka::future::Cache;
use reqwest::header::ACCEPT;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::config::CheckoutConfig;
use crate::error::QueryError;

use cache::CacheEntry;

/// Snapshot of one query, for rendering.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    /// Last successfully fetched dates, kept while refetching or after errors.
    pub data: Option<DeliveryDates>,
    /// No data yet and a fetch is running.
    pub is_loading: bool,
    /// A fetch is running.
    pub is_fetching: bool,
    /// Data is missing, invalidated or older than the stale time.
    pub is_stale: bool,
    /// Error of the most recent fetch, cleared by the next success.
    pub error: Option<Arc<QueryError>>,
}

/// Client for `/api/delivery-dates/available` with a per-key cache.
#[derive(Clone)]
pub struct DeliveryDatesClient {
    inner: Arc<DeliveryDatesClientInner>,
}

struct DeliveryDatesClientInner {
    http: reqwest::Client,
    config: CheckoutConfig,
    cache: Cache<QueryKey, CacheEntry>,
    errors: Cache<QueryKey, Arc<QueryError>>,
    in_flight: Mutex<HashMap<QueryKey, usize>>,
}

impl DeliveryDatesClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: CheckoutConfig) -> Result<Self, QueryError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_idle(config.retention)
            .build();
        let errors = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_idle(config.retention)
            .build();

        Ok(Self {
            inner: Arc::new(DeliveryDatesClientInner {
                http,
                config,
                cache,
                errors,
                in_flight: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.inner.config
    }

    /// Key for the configured endpoint.
    #[must_use]
    pub fn key(&self, postal_code: Option<&str>, country: Option<&str>) -> QueryKey {
        QueryKey::new(self.inner.config.endpoint.clone(), postal_code, country)
    }

    /// Fresh cached dates, or fetch them.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt once retries are exhausted.
    pub async fn fetch(&self, key: &QueryKey) -> Result<DeliveryDates, Arc<QueryError>> {
        if let Some(entry) = self.inner.cache.get(key).await
            && !entry.is_stale(self.inner.config.stale_time)
        {
            debug!("Cache hit for delivery dates");
            return Ok(entry.data);
        }
        self.load(key).await
    }

    /// Fetch from the network regardless of cache state.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt once retries are exhausted.
    pub async fn refetch(&self, key: &QueryKey) -> Result<DeliveryDates, Arc<QueryError>> {
        self.load(key).await
    }

    /// Mark one entry stale. Its data stays visible until the next fetch.
    pub async fn invalidate(&self, key: &QueryKey) {
        if let Some(mut entry) = self.inner.cache.get(key).await {
            entry.invalidated = true;
            self.inner.cache.insert(key.clone(), entry).await;
        }
    }

    /// Mark every entry stale.
    pub async fn invalidate_all(&self) {
        let entries: Vec<(QueryKey, CacheEntry)> = self
            .inner
            .cache
            .iter()
            .map(|(key, entry)| ((*key).clone(), entry))
            .collect();

        for (key, mut entry) in entries {
            entry.invalidated = true;
            self.inner.cache.insert(key, entry).await;
        }
    }

    /// Warm the cache in the background, e.g. when a date field is hovered.
    ///
    /// Errors are recorded in the query state and otherwise ignored.
    pub fn prefetch(&self, key: QueryKey) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.fetch(&key).await {
                debug!(error = %e, "Prefetch failed");
            }
        })
    }

    /// Current state of a query.
    pub async fn state(&self, key: &QueryKey) -> QueryState {
        let entry = self.inner.cache.get(key).await;
        let error = self.inner.errors.get(key).await;
        let is_fetching = self.inner.in_flight.lock().await.contains_key(key);

        let is_stale = entry
            .as_ref()
            .is_none_or(|e| e.is_stale(self.inner.config.stale_time));
        let data = entry.map(|e| e.data);

        QueryState {
            is_loading: data.is_none() && is_fetching,
            is_fetching,
            is_stale,
            data,
            error,
        }
    }

    #[instrument(
        skip(self, key),
        fields(postal_code = key.postal_code.as_deref(), country = key.country.as_deref())
    )]
    async fn load(&self, key: &QueryKey) -> Result<DeliveryDates, Arc<QueryError>> {
        *self
            .inner
            .in_flight
            .lock()
            .await
            .entry(key.clone())
            .or_default() += 1;

        let result = match self.request_with_retry(key).await {
            Ok(dates) => {
                self.inner
                    .cache
                    .insert(key.clone(), CacheEntry::new(Arc::clone(&dates)))
                    .await;
                self.inner.errors.invalidate(key).await;
                Ok(dates)
            }
            Err(e) => {
                let e = Arc::new(e);
                self.inner.errors.insert(key.clone(), Arc::clone(&e)).await;
                Err(e)
            }
        };

        let mut in_flight = self.inner.in_flight.lock().await;
        if let Some(count) = in_flight.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                in_flight.remove(key);
            }
        }

        result
    }

    async fn request_with_retry(&self, key: &QueryKey) -> Result<DeliveryDates, QueryError> {
        let policy = self.inner.config.retry;
        let mut attempt = 0;

        loop {
            match self.request(key).await {
                Ok(dates) => return Ok(dates),
                Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                    let delay = policy.delay(attempt);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Delivery dates fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request(&self, key: &QueryKey) -> Result<DeliveryDates, QueryError> {
        let response = self
            .inner
            .http
            .get(key.url())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let envelope = serde_json::from_slice::<DeliveryDatesResponse>(&body).ok();
            let error = envelope.as_ref().and_then(|e| e.error.clone());
            let message = envelope
                .and_then(|e| e.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
            return Err(QueryError::Status {
                status: status.as_u16(),
                error,
                message,
            });
        }

        let envelope: DeliveryDatesResponse = serde_json::from_slice(&body)?;
        if !envelope.success {
            return Err(QueryError::Api {
                error: envelope
                    .error
                    .unwrap_or_else(|| "unknown_error".to_string()),
                message: envelope.message.unwrap_or_default(),
            });
        }

        debug!(count = envelope.data.len(), "Fetched delivery dates");
        Ok(envelope.data.into())
    }
}
