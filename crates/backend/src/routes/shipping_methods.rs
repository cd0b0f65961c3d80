//! Shipping-method label management.
//!
//! ```text
//! GET    /api/shipping-methods               - List configured labels
//! PUT    /api/shipping-methods/{product_id}  - Set a product's label
//! DELETE /api/shipping-methods/{product_id}  - Remove a product's label
//! ```

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::get,
};
use dutchned_core::{Priority, ProductId};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::state::AppState;
use crate::store::ShippingMethodEntry;

/// Build the shipping-methods router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shipping-methods", get(list_shipping_methods))
        .route(
            "/api/shipping-methods/{product_id}",
            axum::routing::put(set_shipping_method).delete(remove_shipping_method),
        )
}

/// Request for setting a label.
#[derive(Debug, Deserialize)]
pub struct SetShippingMethodRequest {
    pub label: String,
}

/// List response.
#[derive(Debug, Serialize)]
pub struct ShippingMethodsResponse {
    pub success: bool,
    pub data: Vec<ShippingMethodEntry>,
}

/// Response for mutations.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
}

/// List every configured label.
///
/// # Errors
///
/// Returns an error if the store fails.
#[instrument(skip(state))]
pub async fn list_shipping_methods(
    State(state): State<AppState>,
) -> Result<Json<ShippingMethodsResponse>, AppError> {
    let data = state.store().list().await?;
    Ok(Json(ShippingMethodsResponse {
        success: true,
        data,
    }))
}

/// Set the label for one product.
///
/// The label must start with a priority, e.g. `2 - express delivery`.
///
/// # Errors
///
/// Returns `AppError::Validation` for a bad product id or label, or an error
/// if the store fails.
#[instrument(skip(state, body))]
pub async fn set_shipping_method(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    body: Result<Json<SetShippingMethodRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, AppError> {
    let product_id = parse_product_id(&product_id)?;
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let label = validate_label(&request.label)?;

    let previous = state.store().set(product_id.clone(), label.clone()).await?;
    info!(
        product_id = %product_id,
        label = %label,
        previous = previous.as_deref(),
        "Shipping method set"
    );

    Ok(Json(MutationResponse { success: true }))
}

/// Remove the label for one product. Removing an absent label succeeds.
///
/// # Errors
///
/// Returns `AppError::Validation` for a bad product id, or an error if the
/// store fails.
#[instrument(skip(state))]
pub async fn remove_shipping_method(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<MutationResponse>, AppError> {
    let product_id = parse_product_id(&product_id)?;
    let removed = state.store().remove(&product_id).await?;
    info!(product_id = %product_id, removed = removed.is_some(), "Shipping method removed");

    Ok(Json(MutationResponse { success: true }))
}

fn parse_product_id(raw: &str) -> Result<ProductId, AppError> {
    ProductId::parse(raw)
        .ok_or_else(|| AppError::Validation(format!("'{raw}' is not a product id")))
}

fn validate_label(raw: &str) -> Result<String, AppError> {
    let label = raw.trim();
    if label.is_empty() {
        return Err(AppError::Validation("label is required".to_string()));
    }
    if Priority::parse(label).is_none() {
        return Err(AppError::Validation(format!(
            "label '{label}' must start with a priority, e.g. '1 - standard'"
        )));
    }
    Ok(label.to_string())
}
