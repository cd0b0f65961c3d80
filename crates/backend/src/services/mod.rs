//! Business logic services for the backend.
//!
//! # Services
//!
//! - `write_queue` - Rate-limited, fire-and-forget Shopify Admin API writes
//! - `write_back` - Order-creation write-back of delivery date and shipping method

pub mod write_back;
pub mod write_queue;

pub use write_back::{OrderCreated, OrderWriteBack, WriteBackReport};
pub use write_queue::{AdminWriter, TaskSink, WriteQueue, WriteTask};
