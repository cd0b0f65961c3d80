//! Delivery-date commands.
//!
//! # Usage
//!
//! ```bash
//! # Fetch and format dates from the DutchNed API
//! dutchned-cli dates fetch --postal-code 1012AB --country NL
//!
//! # Format a saved upstream payload
//! dutchned-cli dates format --input upstream.json
//!
//! # Disabled dates for the picker
//! dutchned-cli dates disabled 2024-05-01 2024-05-03
//! ```
//!
//! # Environment Variables
//!
//! `fetch` only:
//! - `DUTCHNED_API_URL` - Delivery-date endpoint
//! - `DUTCHNED_API_CREDENTIALS` - `user:password` for basic auth
//! - `API_TIMEOUT` - Request timeout in milliseconds (default 10000)

use std::path::Path;

use dutchned_backend::config::DutchNedConfig;
use dutchned_backend::dutchned::{DeliveryDateQuery, DutchNedClient};
use dutchned_core::calendar::disabled_dates;
use dutchned_core::dates::{FormattedDates, format_delivery_dates, parse_date};

use super::CommandError;
use super::function::read_input;

/// Fetch available dates from the upstream API and print them.
///
/// # Errors
///
/// Returns an error if the configuration is missing or the request fails.
pub async fn fetch(postal_code: Option<&str>, country: Option<&str>) -> Result<(), CommandError> {
    let _ = dotenvy::dotenv();
    let config = DutchNedConfig::from_env()?;
    let client = DutchNedClient::new(&config)?;

    let formatted = client
        .fetch_delivery_dates(&DeliveryDateQuery::new(postal_code, country))
        .await?;

    tracing::info!(
        count = formatted.dates.len(),
        skipped = formatted.warnings.len(),
        "Fetched delivery dates"
    );
    super::print_json(&formatted.dates)
}

/// Format a raw upstream payload and print the result.
///
/// Skipped elements are reported as warnings on stderr by the formatter.
///
/// # Errors
///
/// Returns an error if the input cannot be read or is not JSON.
pub fn format(input: Option<&Path>) -> Result<(), CommandError> {
    let raw = read_input(input)?;
    let formatted = format_payload(&raw)?;

    tracing::info!(
        count = formatted.dates.len(),
        skipped = formatted.warnings.len(),
        "Formatted delivery dates"
    );
    super::print_json(&formatted.dates)
}

fn format_payload(raw: &str) -> Result<FormattedDates, CommandError> {
    let payload: serde_json::Value = serde_json::from_str(raw)?;
    Ok(format_delivery_dates(&payload))
}

/// Print the disabled-date set for the given available dates.
///
/// # Errors
///
/// Returns an error if a date is not `YYYY-MM-DD`.
pub fn disabled(dates: &[String]) -> Result<(), CommandError> {
    let parsed = dates
        .iter()
        .map(|raw| parse_date(raw).ok_or_else(|| CommandError::InvalidDate(raw.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    super::print_json(&disabled_dates(&parsed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_payload_skips_bad_elements() {
        let formatted =
            format_payload(r#"[{"date": "2024-05-02"}, {"date": "later"}, {"date": "2024-05-01"}]"#)
                .unwrap();

        let dates: Vec<String> = formatted.dates.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-05-01", "2024-05-02"]);
        assert_eq!(formatted.warnings.len(), 1);
    }

    #[test]
    fn test_format_payload_rejects_non_json() {
        assert!(matches!(format_payload("{oops"), Err(CommandError::Json(_))));
    }

    #[test]
    fn test_disabled_rejects_bad_dates() {
        let err = disabled(&["2024-05-01".to_string(), "1 mei".to_string()]).unwrap_err();
        assert!(matches!(err, CommandError::InvalidDate(ref raw) if raw == "1 mei"));
    }
}
