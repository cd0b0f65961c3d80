//! Checkout-side configuration.
//!
//! The extension runs inside Shopify's checkout, so there is no environment to
//! read: the host passes the backend URL and everything else has defaults.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// How long fetched dates are served without going back to the network.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// How long unused cache entries are kept at all.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(10 * 60);

/// Maximum number of cached query keys.
pub const DEFAULT_MAX_CAPACITY: u64 = 256;

/// Per-request timeout of the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Path of the delivery-dates endpoint on the backend.
pub const DELIVERY_DATES_PATH: &str = "/api/delivery-dates/available";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid backend URL '{0}': {1}")]
    InvalidUrl(String, String),
}

/// Retry behaviour for failed fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further one.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`,
    /// capped at `max_delay`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Configuration of the delivery-dates query client.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Full URL of the delivery-dates endpoint.
    pub endpoint: Url,
    pub stale_time: Duration,
    pub retention: Duration,
    pub max_capacity: u64,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl CheckoutConfig {
    /// Defaults for a backend served at `backend_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `backend_url` is not an absolute http(s) URL.
    pub fn new(backend_url: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(backend_url)
            .map_err(|e| ConfigError::InvalidUrl(backend_url.to_string(), e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(
                backend_url.to_string(),
                "scheme must be http or https".to_string(),
            ));
        }
        let endpoint = base
            .join(DELIVERY_DATES_PATH)
            .map_err(|e| ConfigError::InvalidUrl(backend_url.to_string(), e.to_string()))?;

        Ok(Self {
            endpoint,
            stale_time: DEFAULT_STALE_TIME,
            retention: DEFAULT_RETENTION,
            max_capacity: DEFAULT_MAX_CAPACITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the stale time.
    #[must_use]
    pub const fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_builds_endpoint() {
        let config = CheckoutConfig::new("https://dutchned.example.com").unwrap();
        assert_eq!(
            config.endpoint.as_str(),
            "https://dutchned.example.com/api/delivery-dates/available"
        );
        assert_eq!(config.stale_time, Duration::from_secs(300));
        assert_eq!(config.retention, Duration::from_secs(600));
    }

    #[test]
    fn test_new_rejects_bad_urls() {
        assert!(CheckoutConfig::new("not a url").is_err());
        assert!(CheckoutConfig::new("ftp://dutchned.example.com").is_err());
    }

    #[test]
    fn test_retry_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(5), Duration::from_secs(30));
        assert_eq!(policy.delay(40), Duration::from_secs(30));
    }
}
