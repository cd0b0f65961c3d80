//! Delivery dates and the delivery-dates API envelope.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A date the carrier can deliver on, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDate {
    /// Calendar date (serialized as `YYYY-MM-DD`).
    pub date: NaiveDate,
    /// Human-readable label, e.g. `woensdag 1 mei`.
    pub display_name: String,
}

/// Response body of `/api/delivery-dates/available`.
///
/// Both the extension (POST) and storefront (GET) contracts return this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDatesResponse {
    /// Whether dates were fetched.
    pub success: bool,
    /// Available dates, empty on failure.
    #[serde(default)]
    pub data: Vec<DeliveryDate>,
    /// Fetch details, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    /// Stable error key, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Details about a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Number of dates returned.
    pub count: usize,
    /// When the upstream call completed.
    pub fetched_at: DateTime<Utc>,
    /// Caller-declared source (`checkout-extension`, `storefront`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Postal code the dates were requested for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Country the dates were requested for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl DeliveryDatesResponse {
    /// Successful response carrying `data`.
    #[must_use]
    pub fn ok(data: Vec<DeliveryDate>, metadata: ResponseMetadata) -> Self {
        Self {
            success: true,
            data,
            metadata: Some(metadata),
            error: None,
            message: None,
        }
    }

    /// Failed response with a stable error key and a message.
    #[must_use]
    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            metadata: None,
            error: Some(error.into()),
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_date_wire_shape() {
        let date = DeliveryDate {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            display_name: "woensdag 1 mei".to_string(),
        };
        let json = serde_json::to_value(&date).unwrap();
        assert_eq!(json["date"], "2024-05-01");
        assert_eq!(json["displayName"], "woensdag 1 mei");
    }

    #[test]
    fn test_failure_envelope_skips_metadata() {
        let response = DeliveryDatesResponse::failure("upstream_timeout", "timed out");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["data"], serde_json::json!([]));
        assert!(json.get("metadata").is_none());
        assert_eq!(json["error"], "upstream_timeout");
    }

    #[test]
    fn test_envelope_parses_without_optional_fields() {
        let response: DeliveryDatesResponse =
            serde_json::from_str(r#"{"success":true,"data":[]}"#).unwrap();
        assert!(response.success);
        assert!(response.metadata.is_none());
    }
}
