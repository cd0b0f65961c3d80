//! Core types for the DutchNed add-on.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the backend, the checkout side and the CLI.

pub mod delivery;
pub mod id;
pub mod metafield;
pub mod priority;

pub use delivery::{DeliveryDate, DeliveryDatesResponse, ResponseMetadata};
pub use id::*;
pub use metafield::*;
pub use priority::Priority;
