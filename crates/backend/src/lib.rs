//! DutchNed backend library.
//!
//! This crate provides the backend functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Security
//!
//! This crate holds two secrets:
//! - DutchNed API credentials (HTTP basic auth)
//! - Shopify Admin API token and webhook secret
//!
//! Neither is ever logged; both are wrapped in `SecretString`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod dutchned;
pub mod error;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
pub mod store;
