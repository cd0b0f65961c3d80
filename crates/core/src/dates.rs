//! Formatting of upstream delivery-date payloads.
//!
//! The DutchNed scheduling API returns a JSON array of objects carrying at
//! least a `date` field. Each valid element becomes a [`DeliveryDate`]; bad
//! elements are skipped with a warning rather than failing the whole payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Locale, NaiveDate};
use serde_json::Value;

use crate::types::DeliveryDate;

/// Something skipped while formatting a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateWarning {
    /// The payload was not a JSON array.
    NotAnArray,
    /// Element `index` had no string `date` field.
    MissingDate { index: usize },
    /// Element `index` had a `date` that is not a calendar date.
    InvalidDate { index: usize, value: String },
}

impl std::fmt::Display for DateWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnArray => write!(f, "payload is not an array"),
            Self::MissingDate { index } => write!(f, "element {index} has no date"),
            Self::InvalidDate { index, value } => {
                write!(f, "element {index} has invalid date {value:?}")
            }
        }
    }
}

/// Result of [`format_delivery_dates`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedDates {
    /// Valid dates, ascending and unique.
    pub dates: Vec<DeliveryDate>,
    /// One entry per skipped element (or a single `NotAnArray`).
    pub warnings: Vec<DateWarning>,
}

/// Convert an upstream payload into display-ready delivery dates.
///
/// Never fails. Every warning is also logged at `warn` level.
#[must_use]
pub fn format_delivery_dates(payload: &Value) -> FormattedDates {
    let Some(elements) = payload.as_array() else {
        tracing::warn!(kind = json_kind(payload), "Delivery date payload is not an array");
        return FormattedDates {
            dates: Vec::new(),
            warnings: vec![DateWarning::NotAnArray],
        };
    };

    let mut by_date = BTreeMap::new();
    let mut warnings = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        let Some(raw) = element.get("date").and_then(Value::as_str) else {
            tracing::warn!(index, "Skipping delivery date without a date field");
            warnings.push(DateWarning::MissingDate { index });
            continue;
        };

        match parse_date(raw) {
            Some(date) => {
                by_date.entry(date).or_insert_with(|| DeliveryDate {
                    date,
                    display_name: display_name(date),
                });
            }
            None => {
                tracing::warn!(index, value = %raw, "Skipping invalid delivery date");
                warnings.push(DateWarning::InvalidDate {
                    index,
                    value: raw.to_string(),
                });
            }
        }
    }

    FormattedDates {
        dates: by_date.into_values().collect(),
        warnings,
    }
}

/// Parse `YYYY-MM-DD`, or an RFC 3339 timestamp (its local calendar date).
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Dutch long display name, e.g. `woensdag 1 mei`.
#[must_use]
pub fn display_name(date: NaiveDate) -> String {
    date.format_localized("%A %-d %B", Locale::nl_NL).to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
