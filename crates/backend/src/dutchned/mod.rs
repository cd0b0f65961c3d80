//! DutchNed scheduling API client.
//!
//! The upstream exposes a single authenticated GET endpoint returning the
//! delivery dates available for an address. Responses are turned into
//! display-ready [`dutchned_core::DeliveryDate`]s by
//! [`dutchned_core::dates::format_delivery_dates`].

mod client;

pub use client::{DeliveryDateQuery, DutchNedClient};

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when calling the DutchNed API.
#[derive(Debug, Error)]
pub enum DutchNedError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream did not answer within the configured timeout.
    #[error("DutchNed API timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The upstream answered with a non-2xx status.
    #[error("DutchNed API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl DutchNedError {
    /// Whether this error is the request timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_error_display() {
        let err = DutchNedError::Timeout(Duration::from_millis(10_000));
        assert_eq!(err.to_string(), "DutchNed API timed out after 10000ms");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_status_error_display() {
        let err = DutchNedError::Status {
            status: 503,
            body: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "DutchNed API returned 503: maintenance");
        assert!(!err.is_timeout());
    }
}
