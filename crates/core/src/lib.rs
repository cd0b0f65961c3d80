//! DutchNed Core - Shared types and pure checkout algorithms.
//!
//! This crate provides the pieces used across all DutchNed components:
//! - `backend` - Delivery-date API, order webhooks, Shopify write queue
//! - `checkout` - Checkout-extension side delivery-date query and picker
//! - `cli` - Operator tooling (runs the shipping-method function locally)
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. The shipping-method selector in particular must stay
//! deterministic because it mirrors what runs inside Shopify's function
//! sandbox for every checkout.
//!
//! # Modules
//!
//! - [`types`] - Shopify GIDs, priorities, delivery dates, metafields, API envelopes
//! - [`shipping`] - Shipping-method selection over cart lines and delivery options
//! - [`dates`] - Formatting of upstream delivery-date payloads
//! - [`calendar`] - Disabled-date computation for the date picker

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod calendar;
pub mod dates;
pub mod shipping;
pub mod types;

pub use types::*;
