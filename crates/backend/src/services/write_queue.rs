//! Best-effort queue for Shopify Admin API writes.
//!
//! Handlers and webhook processing never talk to the Admin API directly. They
//! submit a [`WriteTask`] to a [`TaskSink`] and move on:
//! 1. `submit` pushes onto a bounded channel without waiting
//! 2. A single worker drains the channel, paced by a `governor` rate limiter
//! 3. Each task is executed through an [`AdminWriter`]
//! 4. Failures are logged and reported to Sentry, never returned to the caller
//!
//! A full or closed queue drops the task with a warning.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dutchned_core::{MetafieldInput, OrderId};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::WriteQueueConfig;
use crate::shopify::{AdminShopifyError, DeliveryCustomizationInput};

/// Attempts per task when Shopify throttles the write.
const MAX_RATE_LIMITED_ATTEMPTS: u32 = 3;

/// Longest `Retry-After` the worker honours before retrying.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// One Admin API write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteTask {
    /// `metafieldsSet`; every input carries its owner id.
    SetMetafields { metafields: Vec<MetafieldInput> },
    /// `orderUpdate` writing metafields onto one order.
    UpdateOrder {
        order_id: OrderId,
        metafields: Vec<MetafieldInput>,
    },
    /// `deliveryCustomizationCreate`.
    CreateDeliveryCustomization(DeliveryCustomizationInput),
}

impl WriteTask {
    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SetMetafields { .. } => "metafields_set",
            Self::UpdateOrder { .. } => "order_update",
            Self::CreateDeliveryCustomization(_) => "delivery_customization_create",
        }
    }
}

/// Executes write tasks against the Admin API.
#[async_trait]
pub trait AdminWriter: Send + Sync {
    /// Perform one write.
    async fn write(&self, task: &WriteTask) -> Result<(), AdminShopifyError>;
}

/// Accepts write tasks without reporting their outcome.
pub trait TaskSink: Send + Sync {
    /// Hand off a task. Never blocks and never fails the caller.
    fn submit(&self, task: WriteTask);
}

/// Bounded, rate-limited [`TaskSink`] backed by a tokio channel.
#[derive(Clone)]
pub struct WriteQueue {
    sender: mpsc::Sender<WriteTask>,
    dropped: Arc<AtomicU64>,
}

impl WriteQueue {
    /// Create the queue and spawn its worker on the current runtime.
    ///
    /// The worker stops once every clone of the queue has been dropped and
    /// the remaining tasks are drained.
    #[must_use]
    pub fn spawn(writer: Arc<dyn AdminWriter>, config: WriteQueueConfig) -> (Self, JoinHandle<()>) {
        let capacity = config.capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let limiter = rate_limiter(config.rate_per_second);
        let handle = tokio::spawn(run_worker(receiver, writer, limiter));

        info!(
            capacity,
            rate_per_second = config.rate_per_second.get(),
            "Write queue started"
        );

        (
            Self {
                sender,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            handle,
        )
    }

    /// Tasks dropped because the queue was full or closed.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Tasks waiting for the worker.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}

impl TaskSink for WriteQueue {
    fn submit(&self, task: WriteTask) {
        let kind = task.kind();
        match self.sender.try_send(task) {
            Ok(()) => debug!(kind, "Write task queued"),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(kind, "Write queue full, dropping task");
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(kind, "Write queue closed, dropping task");
            }
        }
    }
}

fn rate_limiter(rate_per_second: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(rate_per_second))
}

async fn run_worker(
    mut receiver: mpsc::Receiver<WriteTask>,
    writer: Arc<dyn AdminWriter>,
    limiter: DefaultDirectRateLimiter,
) {
    while let Some(task) = receiver.recv().await {
        execute(writer.as_ref(), &limiter, &task).await;
    }
    info!("Write queue closed, worker exiting");
}

async fn execute(writer: &dyn AdminWriter, limiter: &DefaultDirectRateLimiter, task: &WriteTask) {
    let kind = task.kind();

    for attempt in 1..=MAX_RATE_LIMITED_ATTEMPTS {
        limiter.until_ready().await;

        match writer.write(task).await {
            Ok(()) => {
                info!(kind, attempt, "Write task completed");
                return;
            }
            Err(AdminShopifyError::RateLimited(retry_after))
                if attempt < MAX_RATE_LIMITED_ATTEMPTS =>
            {
                let wait = Duration::from_secs(retry_after).min(MAX_RETRY_AFTER);
                warn!(kind, attempt, retry_after, "Shopify rate limited write, retrying");
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                let event_id = sentry::capture_error(&e);
                error!(
                    kind,
                    attempt,
                    error = %e,
                    sentry_event_id = %event_id,
                    "Write task failed"
                );
                return;
            }
        }
    }
}
