//! HTTP route handlers for the backend.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                - Health check
//!
//! # Delivery dates (public, called from storefront and checkout)
//! GET  /api/delivery-dates/available          - Available dates (query string)
//! POST /api/delivery-dates/available          - Available dates (JSON body)
//!
//! # Shipping methods (per-product labels)
//! GET    /api/shipping-methods                - List labels
//! PUT    /api/shipping-methods/{product_id}   - Set label
//! DELETE /api/shipping-methods/{product_id}   - Remove label
//!
//! # Delivery customizations
//! POST /api/delivery-customizations           - Attach the selector function
//!
//! # Webhooks (HMAC verified)
//! POST /webhooks/orders/create                - Order write-back
//! ```

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub mod delivery_customizations;
pub mod delivery_dates;
pub mod shipping_methods;
pub mod webhooks;

/// All API routes, without state.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(delivery_dates::router().layer(CorsLayer::permissive()))
        .merge(shipping_methods::router())
        .merge(delivery_customizations::router())
        .merge(webhooks::router())
}

/// Complete application router with state applied.
///
/// Tracing and Sentry layers are added by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the upstream API.
async fn health() -> &'static str {
    "ok"
}
