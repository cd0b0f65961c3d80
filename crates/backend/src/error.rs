//! Unified error handling for the backend API.
//!
//! Every failure is rendered as the JSON envelope
//! `{success: false, data: [], error: <key>, message}` with a stable error key.
//! Server-side failures are captured to Sentry before responding.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dutchned_core::DeliveryDatesResponse;
use thiserror::Error;

use crate::dutchned::DutchNedError;
use crate::store::StoreError;

/// Application-level error type for the backend.
#[derive(Debug, Error)]
pub enum AppError {
    /// DutchNed API call failed.
    #[error("DutchNed error: {0}")]
    DutchNed(#[from] DutchNedError),

    /// Shipping-method store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Request failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request signature missing or invalid.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Feature needs configuration that is missing.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable error key sent to clients.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::DutchNed(DutchNedError::Timeout(_)) => "upstream_timeout",
            Self::DutchNed(_) => "upstream_error",
            Self::Validation(_) => "validation_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::NotConfigured(_) => "not_configured",
            Self::Store(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::DutchNed(DutchNedError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::DutchNed(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients.
    fn public_message(&self) -> String {
        match self {
            Self::DutchNed(DutchNedError::Timeout(_)) => {
                "Delivery date service did not respond in time".to_string()
            }
            Self::DutchNed(_) => "Delivery date service error".to_string(),
            Self::Store(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Validation(msg)
            | Self::Unauthorized(msg)
            | Self::NotFound(msg)
            | Self::NotConfigured(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                error_key = self.key(),
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, error_key = self.key(), "Request rejected");
        }

        let body = DeliveryDatesResponse::failure(self.key(), self.public_message());
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Validation("shopDomain is required".to_string());
        assert_eq!(err.to_string(), "Validation error: shopDomain is required");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::DutchNed(DutchNedError::Timeout(
                Duration::from_millis(10)
            ))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            get_status(AppError::DutchNed(DutchNedError::Status {
                status: 500,
                body: String::new()
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_error_body_hides_internals() {
        let response = AppError::DutchNed(DutchNedError::Status {
            status: 500,
            body: "stack trace at dutchned.internal".to_string(),
        })
        .into_response();
        let json = body_json(response).await;

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "upstream_error");
        assert_eq!(json["data"], serde_json::json!([]));
        assert!(!json.to_string().contains("dutchned.internal"));
    }

    #[tokio::test]
    async fn test_validation_message_is_passed_through() {
        let error = AppError::Validation("shopDomain is required".to_string());
        let json = body_json(error.into_response()).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["message"], "shopDomain is required");
    }
}
