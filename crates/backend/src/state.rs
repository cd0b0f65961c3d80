//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::BackendConfig;
use crate::dutchned::DutchNedClient;
use crate::services::{OrderWriteBack, TaskSink};
use crate::store::ShippingMethodStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The write sink and the shipping-method store
/// are trait objects so tests and alternative deployments can swap them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BackendConfig,
    dutchned: DutchNedClient,
    store: Arc<dyn ShippingMethodStore>,
    sink: Arc<dyn TaskSink>,
    write_back: OrderWriteBack,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: BackendConfig,
        dutchned: DutchNedClient,
        store: Arc<dyn ShippingMethodStore>,
        sink: Arc<dyn TaskSink>,
    ) -> Self {
        let write_back = OrderWriteBack::new(Arc::clone(&sink), Arc::clone(&store));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                dutchned,
                store,
                sink,
                write_back,
            }),
        }
    }

    /// Get a reference to the backend configuration.
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    /// Get a reference to the DutchNed API client.
    #[must_use]
    pub fn dutchned(&self) -> &DutchNedClient {
        &self.inner.dutchned
    }

    /// Get the shipping-method store.
    #[must_use]
    pub fn store(&self) -> &dyn ShippingMethodStore {
        self.inner.store.as_ref()
    }

    /// Get the Admin API write sink.
    #[must_use]
    pub fn sink(&self) -> &dyn TaskSink {
        self.inner.sink.as_ref()
    }

    /// Get the order write-back service.
    #[must_use]
    pub fn write_back(&self) -> &OrderWriteBack {
        &self.inner.write_back
    }
}
