//! Shopify webhook receiver.
//!
//! ```text
//! POST /webhooks/orders/create
//! ```
//!
//! The body is verified against `X-Shopify-Hmac-Sha256` before it is parsed.
//! Once verified the endpoint always answers 200 so Shopify does not retry;
//! the write-back itself is best-effort.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::services::OrderCreated;
use crate::shopify::webhook::{self, HMAC_HEADER, SHOP_DOMAIN_HEADER, TOPIC_HEADER};
use crate::state::AppState;

/// Topic this endpoint handles.
const ORDERS_CREATE_TOPIC: &str = "orders/create";

/// Build the webhooks router.
pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/orders/create", post(orders_create))
}

/// Handle an `orders/create` webhook.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the signature is missing or invalid.
#[instrument(skip(state, headers, body), fields(shop = header(&headers, SHOP_DOMAIN_HEADER)))]
pub async fn orders_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    webhook::verify(
        &state.config().shopify.api_secret,
        &body,
        header(&headers, HMAC_HEADER),
    )
    .map_err(|e| {
        warn!(error = %e, "Rejected webhook");
        AppError::Unauthorized(format!("webhook {e}"))
    })?;

    if let Some(topic) = header(&headers, TOPIC_HEADER)
        && topic != ORDERS_CREATE_TOPIC
    {
        warn!(topic, "Unexpected webhook topic, ignoring");
        return Ok(StatusCode::OK);
    }

    let order: OrderCreated = match serde_json::from_slice(&body) {
        Ok(order) => order,
        Err(e) => {
            warn!(error = %e, "Unreadable orders/create payload, ignoring");
            return Ok(StatusCode::OK);
        }
    };

    let report = state.write_back().on_order_created(&order).await;
    info!(
        order_id = order.id,
        submitted = report.submitted(),
        "Processed orders/create webhook"
    );

    Ok(StatusCode::OK)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
