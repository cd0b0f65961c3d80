//! Delivery-date availability endpoints.
//!
//! ```text
//! GET  /api/delivery-dates/available?postalCode&country   - storefront
//! POST /api/delivery-dates/available                      - checkout extension
//! ```
//!
//! Both return the [`DeliveryDatesResponse`] envelope.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection, rejection::QueryRejection},
    routing::get,
};
use chrono::Utc;
use dutchned_core::{DeliveryDatesResponse, ResponseMetadata};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::dutchned::DeliveryDateQuery;
use crate::error::AppError;
use crate::state::AppState;

/// Source recorded for GET requests that do not name one.
const STOREFRONT_SOURCE: &str = "storefront";

/// Build the delivery-dates router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/delivery-dates/available",
        get(available_dates_get).post(available_dates_post),
    )
}

/// Query string of the GET endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDatesQuery {
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub source: Option<String>,
}

/// Body of the POST endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDatesRequest {
    pub shop_domain: Option<String>,
    /// Client timestamp, logged only. Either an ISO string or epoch millis.
    pub timestamp: Option<Value>,
    pub source: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Available delivery dates for the storefront.
///
/// # Errors
///
/// Returns `AppError::Validation` for an unreadable query string and the
/// upstream errors of [`fetch`].
#[instrument(skip(state, query))]
pub async fn available_dates_get(
    State(state): State<AppState>,
    query: Result<Query<AvailableDatesQuery>, QueryRejection>,
) -> Result<Json<DeliveryDatesResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let source = query
        .source
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| STOREFRONT_SOURCE.to_string());

    fetch(
        &state,
        DeliveryDateQuery::new(query.postal_code.as_deref(), query.country.as_deref()),
        Some(source),
    )
    .await
}

/// Available delivery dates for the checkout extension.
///
/// # Errors
///
/// Returns `AppError::Validation` when the body is not JSON or `shopDomain`
/// is missing or malformed, and the upstream errors of [`fetch`].
#[instrument(skip(state, body))]
pub async fn available_dates_post(
    State(state): State<AppState>,
    body: Result<Json<AvailableDatesRequest>, JsonRejection>,
) -> Result<Json<DeliveryDatesResponse>, AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let shop_domain = validate_shop_domain(request.shop_domain.as_deref())?;

    tracing::debug!(
        shop_domain,
        source = request.source.as_deref(),
        client_timestamp = ?request.timestamp,
        "Delivery dates requested"
    );

    fetch(
        &state,
        DeliveryDateQuery::new(request.postal_code.as_deref(), request.country.as_deref()),
        request.source,
    )
    .await
}

async fn fetch(
    state: &AppState,
    query: DeliveryDateQuery,
    source: Option<String>,
) -> Result<Json<DeliveryDatesResponse>, AppError> {
    let formatted = state.dutchned().fetch_delivery_dates(&query).await?;

    let metadata = ResponseMetadata {
        count: formatted.dates.len(),
        fetched_at: Utc::now(),
        source,
        postal_code: query.postal_code,
        country: query.country,
    };

    Ok(Json(DeliveryDatesResponse::ok(formatted.dates, metadata)))
}

/// Require a plausible `*.myshopify.com`-style host name.
fn validate_shop_domain(shop_domain: Option<&str>) -> Result<&str, AppError> {
    let domain = shop_domain
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::Validation("shopDomain is required".to_string()))?;

    let well_formed = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if !well_formed {
        return Err(AppError::Validation(format!(
            "shopDomain '{domain}' is not a valid shop domain"
        )));
    }
    Ok(domain)
}
