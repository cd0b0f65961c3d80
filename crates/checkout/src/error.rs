//! Errors of the delivery-dates query.

use thiserror::Error;

/// Why a delivery-dates fetch failed.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Transport failure: connection refused, reset, timed out.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        /// Error key from the response envelope, if one could be read.
        error: Option<String>,
        message: String,
    },

    /// Backend answered 2xx but `success` was false.
    #[error("{error}: {message}")]
    Api { error: String, message: String },

    /// Response body was not the expected envelope.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl QueryError {
    /// Whether another attempt may succeed.
    ///
    /// Network failures and 5xx responses are retried. 4xx responses are the
    /// caller's fault and are never retried, nor are malformed bodies.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Api { .. } | Self::Decode(_) => false,
        }
    }

    /// Error key reported by the backend, if any.
    #[must_use]
    pub fn error_key(&self) -> Option<&str> {
        match self {
            Self::Status { error, .. } => error.as_deref(),
            Self::Api { error, .. } => Some(error),
            Self::Http(_) | Self::Decode(_) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status(status: u16) -> QueryError {
        QueryError::Status {
            status,
            error: None,
            message: String::new(),
        }
    }

    #[test]
    fn test_only_server_errors_are_retryable() {
        assert!(status(500).is_retryable());
        assert!(status(504).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(429).is_retryable());
    }

    #[test]
    fn test_api_and_decode_are_final() {
        let api = QueryError::Api {
            error: "upstream_error".to_string(),
            message: "down".to_string(),
        };
        assert!(!api.is_retryable());
        assert_eq!(api.error_key(), Some("upstream_error"));

        let decode = QueryError::Decode(serde_json::from_str::<u8>("x").unwrap_err());
        assert!(!decode.is_retryable());
        assert_eq!(decode.error_key(), None);
    }
}
