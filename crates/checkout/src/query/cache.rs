//! Cache types for delivery-date queries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dutchned_core::DeliveryDate;
use url::Url;

/// Dates shared between the cache and callers.
pub type DeliveryDates = Arc<[DeliveryDate]>;

/// Identity of one delivery-dates query.
///
/// Blank postal codes and countries are treated as absent so `""` and `None`
/// share a cache entry.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct QueryKey {
    pub endpoint: Url,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl QueryKey {
    #[must_use]
    pub fn new(endpoint: Url, postal_code: Option<&str>, country: Option<&str>) -> Self {
        Self {
            endpoint,
            postal_code: normalize(postal_code),
            country: normalize(country),
        }
    }

    /// Request URL for this key.
    #[must_use]
    pub fn url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if self.postal_code.is_some() || self.country.is_some() {
            let mut pairs = url.query_pairs_mut();
            if let Some(postal_code) = &self.postal_code {
                pairs.append_pair("postalCode", postal_code);
            }
            if let Some(country) = &self.country {
                pairs.append_pair("country", country);
            }
        }
        url
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A cached successful fetch.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub data: DeliveryDates,
    pub fetched_at: Instant,
    /// Set by invalidation; the data is kept for display until refetched.
    pub invalidated: bool,
}

impl CacheEntry {
    pub fn new(data: DeliveryDates) -> Self {
        Self {
            data,
            fetched_at: Instant::now(),
            invalidated: false,
        }
    }

    pub fn is_stale(&self, stale_time: Duration) -> bool {
        self.invalidated || self.fetched_at.elapsed() >= stale_time
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("https://dutchned.example.com/api/delivery-dates/available").unwrap()
    }

    #[test]
    fn test_blank_values_share_a_key() {
        assert_eq!(
            QueryKey::new(endpoint(), Some("  "), Some("")),
            QueryKey::new(endpoint(), None, None)
        );
        assert_ne!(
            QueryKey::new(endpoint(), Some("1012AB"), None),
            QueryKey::new(endpoint(), None, None)
        );
    }

    #[test]
    fn test_url_only_carries_present_params() {
        let bare = QueryKey::new(endpoint(), None, None).url();
        assert_eq!(bare.query(), None);

        let full = QueryKey::new(endpoint(), Some("1012 AB"), Some("NL")).url();
        assert_eq!(full.query(), Some("postalCode=1012+AB&country=NL"));
    }

    #[test]
    fn test_entry_staleness() {
        let mut entry = CacheEntry::new(Arc::from(Vec::<DeliveryDate>::new()));
        assert!(!entry.is_stale(Duration::from_secs(300)));
        assert!(entry.is_stale(Duration::ZERO));

        entry.invalidated = true;
        assert!(entry.is_stale(Duration::from_secs(300)));
    }
}
