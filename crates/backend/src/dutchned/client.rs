//! HTTP client for the DutchNed delivery-date endpoint.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dutchned_core::dates::{FormattedDates, format_delivery_dates};
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::config::DutchNedConfig;

use super::DutchNedError;

/// Upstream error bodies are cut to this many characters before logging.
const MAX_LOGGED_BODY_CHARS: usize = 500;

/// Address filter for a delivery-date lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDateQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl DeliveryDateQuery {
    /// Build a query, dropping blank values.
    #[must_use]
    pub fn new(postal_code: Option<&str>, country: Option<&str>) -> Self {
        let clean = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            postal_code: clean(postal_code),
            country: clean(country),
        }
    }
}

/// DutchNed scheduling API client.
///
/// Every request carries Basic credentials and is bounded by the configured
/// timeout. A request that outlives the timeout is dropped, which cancels it.
#[derive(Clone)]
pub struct DutchNedClient {
    inner: Arc<DutchNedClientInner>,
}

struct DutchNedClientInner {
    client: reqwest::Client,
    api_url: Url,
    user: String,
    password: SecretString,
    timeout: Duration,
}

impl DutchNedClient {
    /// Create a new DutchNed client.
    ///
    /// # Errors
    ///
    /// Returns `DutchNedError::InvalidUrl` if the endpoint has no host, or
    /// `DutchNedError::Http` if the HTTP client cannot be built.
    pub fn new(config: &DutchNedConfig) -> Result<Self, DutchNedError> {
        if config.api_url.host_str().is_none() {
            return Err(DutchNedError::InvalidUrl(config.api_url.to_string()));
        }

        let (user, password) = config.basic_auth();
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            inner: Arc::new(DutchNedClientInner {
                client,
                api_url: config.api_url.clone(),
                user,
                password: SecretString::from(password),
                timeout: config.timeout,
            }),
        })
    }

    /// Configured request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Fetch and format the delivery dates available for `query`.
    ///
    /// Elements of the upstream payload that are not valid dates are skipped
    /// and reported in [`FormattedDates::warnings`].
    ///
    /// # Errors
    ///
    /// Returns `DutchNedError::Timeout` if the upstream does not answer in
    /// time, `DutchNedError::Status` on a non-2xx response,
    /// `DutchNedError::Http` on network failures and `DutchNedError::Parse`
    /// if the body is not JSON.
    #[instrument(skip(self), fields(postal_code = ?query.postal_code, country = ?query.country))]
    pub async fn fetch_delivery_dates(
        &self,
        query: &DeliveryDateQuery,
    ) -> Result<FormattedDates, DutchNedError> {
        let url = self.request_url(query);
        let timeout = self.inner.timeout;
        let started = Instant::now();

        let payload = tokio::time::timeout(timeout, self.get_json(url))
            .await
            .map_err(|_| {
                tracing::error!(
                    timeout_ms = duration_ms(timeout),
                    "DutchNed request timed out"
                );
                DutchNedError::Timeout(timeout)
            })??;

        let formatted = format_delivery_dates(&payload);
        tracing::info!(
            count = formatted.dates.len(),
            skipped = formatted.warnings.len(),
            latency_ms = duration_ms(started.elapsed()),
            "Fetched delivery dates"
        );

        Ok(formatted)
    }

    /// Endpoint URL with the query's address parameters appended.
    fn request_url(&self, query: &DeliveryDateQuery) -> Url {
        let mut url = self.inner.api_url.clone();
        let params: Vec<(&str, &str)> = [
            ("postalCode", query.postal_code.as_deref()),
            ("country", query.country.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect();

        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        url
    }

    async fn get_json(&self, url: Url) -> Result<serde_json::Value, DutchNedError> {
        let response = self
            .inner
            .client
            .get(url)
            .basic_auth(&self.inner.user, Some(self.inner.password.expose_secret()))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = truncate_body(&response.text().await.unwrap_or_default());
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                "DutchNed API returned an error"
            );
            return Err(DutchNedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_LOGGED_BODY_CHARS {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_LOGGED_BODY_CHARS).collect();
    truncated.push_str("...");
    truncated
}

#[allow(clippy::cast_possible_truncation)]
fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
