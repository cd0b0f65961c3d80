//! Delivery customization registration.
//!
//! ```text
//! POST /api/delivery-customizations   - Attach the shipping-method function
//! ```
//!
//! The customization is created asynchronously through the write queue, so the
//! endpoint answers 202 once the task is queued.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use dutchned_core::{MetafieldInput, shipping::SelectorConfig};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::routes::shipping_methods::MutationResponse;
use crate::services::WriteTask;
use crate::shopify::DeliveryCustomizationInput;
use crate::state::AppState;

/// Title used when the request does not name one.
pub const DEFAULT_CUSTOMIZATION_TITLE: &str = "DutchNed shipping method";

/// Build the delivery-customizations router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/delivery-customizations",
        post(create_delivery_customization),
    )
}

/// Body of the create request. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateDeliveryCustomizationRequest {
    pub title: Option<String>,
    pub enabled: Option<bool>,
    pub config: Option<SelectorConfig>,
}

/// Queue creation of a delivery customization bound to the shipping-method
/// function.
///
/// # Errors
///
/// Returns `AppError::NotConfigured` when no function id is configured,
/// `AppError::Validation` for an unreadable body.
#[instrument(skip(state, body))]
pub async fn create_delivery_customization(
    State(state): State<AppState>,
    body: Result<Json<CreateDeliveryCustomizationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MutationResponse>), AppError> {
    let function_id = state
        .config()
        .shopify
        .shipping_function_id
        .clone()
        .ok_or_else(|| {
            AppError::NotConfigured("SHIPPING_FUNCTION_ID is not set".to_string())
        })?;
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let input = build_input(function_id, request)?;
    info!(
        function_id = %input.function_id,
        title = %input.title,
        enabled = input.enabled,
        "Queueing delivery customization"
    );
    state
        .sink()
        .submit(WriteTask::CreateDeliveryCustomization(input));

    Ok((StatusCode::ACCEPTED, Json(MutationResponse { success: true })))
}

fn build_input(
    function_id: String,
    request: CreateDeliveryCustomizationRequest,
) -> Result<DeliveryCustomizationInput, AppError> {
    let config = request.config.unwrap_or_default();
    let value = serde_json::to_string(&config)
        .map_err(|e| AppError::Internal(format!("Failed to encode selector config: {e}")))?;

    let title = request
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_CUSTOMIZATION_TITLE.to_string());

    Ok(DeliveryCustomizationInput {
        function_id,
        title,
        enabled: request.enabled.unwrap_or(true),
        metafields: vec![MetafieldInput::function_config(value)],
    })
}
