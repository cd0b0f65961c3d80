//! DutchNed checkout library.
//!
//! The checkout-extension side of the delivery-date flow:
//! - [`query`] - Cached, retrying client for the backend's delivery-dates endpoint
//! - [`picker`] - Date-picker selection state and the `deliveryDate` attribute write
//!
//! # Example
//!
//! ```rust,ignore
//! use dutchned_checkout::{CheckoutConfig, DatePicker, DeliveryDatesClient};
//!
//! let client = DeliveryDatesClient::new(CheckoutConfig::new("https://backend.example.com")?)?;
//! let key = client.key(Some("1012AB"), Some("NL"));
//! client.prefetch(key.clone());
//!
//! let mut picker = DatePicker::new();
//! picker.load(&client, &key).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod picker;
pub mod query;

pub use config::{CheckoutConfig, RetryPolicy};
pub use error::QueryError;
pub use picker::{AttributeError, AttributeWriter, DatePicker, PickerError};
pub use query::{DeliveryDates, DeliveryDatesClient, QueryKey, QueryState};
