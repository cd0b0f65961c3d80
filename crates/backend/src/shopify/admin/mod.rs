//! Shopify Admin API GraphQL client.
//!
//! Authenticates with the app's Admin API access token and sends the three
//! mutations this app needs: `metafieldsSet`, `orderUpdate` and
//! `deliveryCustomizationCreate`.

use std::sync::Arc;

use async_trait::async_trait;
use dutchned_core::{MetafieldInput, OrderId};
use graphql_client::GraphQLQuery;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::instrument;

use crate::config::ShopifyAdminConfig;
use crate::services::write_queue::{AdminWriter, WriteTask};

use super::{AdminShopifyError, GraphQLError, GraphQLErrorLocation};

pub mod queries;

use queries::{
    DeliveryCustomizationCreate, DeliveryCustomizationCreateVariables, DeliveryCustomizationInput,
    MetafieldsSet, MetafieldsSetVariables, OrderInput, OrderUpdate, OrderUpdateVariables,
    SetMetafield, join_user_errors,
};

/// Shopify Admin API GraphQL client.
///
/// # Security
///
/// This client holds the Admin API access token, which has HIGH PRIVILEGE
/// access to the store's orders.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

/// Error code Shopify uses when the query-cost bucket is empty.
const THROTTLED_CODE: &str = "THROTTLED";

/// Wait used when a throttled response carries no cost information.
const DEFAULT_THROTTLE_RETRY_SECS: u64 = 1;

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
    #[serde(default)]
    extensions: Option<ResponseExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
    #[serde(default)]
    extensions: Option<GraphQLErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorExtensions {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseExtensions {
    #[serde(default)]
    cost: Option<QueryCost>,
}

/// Query cost report attached to every Admin API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryCost {
    #[serde(default)]
    requested_query_cost: f64,
    throttle_status: ThrottleStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThrottleStatus {
    currently_available: f64,
    restore_rate: f64,
}

impl QueryCost {
    /// Seconds until the bucket has restored enough points for this query.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn retry_after_secs(&self) -> u64 {
        let missing = self.requested_query_cost - self.throttle_status.currently_available;
        if missing <= 0.0 || self.throttle_status.restore_rate <= 0.0 {
            return DEFAULT_THROTTLE_RETRY_SECS;
        }
        ((missing / self.throttle_status.restore_rate).ceil() as u64).max(1)
    }
}

impl GraphQLErrorResponse {
    fn is_throttled(&self) -> bool {
        self.extensions
            .as_ref()
            .and_then(|e| e.code.as_deref())
            == Some(THROTTLED_CODE)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

impl AdminClient {
    /// Create a new Admin API client.
    #[must_use]
    pub fn new(config: &ShopifyAdminConfig) -> Self {
        Self::with_endpoint(config.graphql_endpoint(), config.access_token.clone())
    }

    /// Create a client against an explicit GraphQL endpoint.
    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            inner: Arc::new(AdminClientInner {
                client: reqwest::Client::new(),
                endpoint: endpoint.into(),
                access_token,
            }),
        }
    }

    /// GraphQL endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, AdminShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(
                "X-Shopify-Access-Token",
                self.inner.access_token.expose_secret(),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(AdminShopifyError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AdminShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            ));
        }

        let response = response.error_for_status()?;
        let bytes = response.bytes().await?;
        let graphql_response: GraphQLResponse<Q::ResponseData> = serde_json::from_slice(&bytes)?;

        // Check for GraphQL errors
        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            // Throttling arrives as a 200 with a THROTTLED error code
            if errors.iter().any(GraphQLErrorResponse::is_throttled) {
                let retry_after = graphql_response
                    .extensions
                    .and_then(|e| e.cost)
                    .map_or(DEFAULT_THROTTLE_RETRY_SECS, |cost| cost.retry_after_secs());
                return Err(AdminShopifyError::RateLimited(retry_after));
            }

            let converted_errors: Vec<GraphQLError> = errors
                .into_iter()
                .map(|e| GraphQLError {
                    message: e.message,
                    locations: e
                        .locations
                        .into_iter()
                        .map(|l| GraphQLErrorLocation {
                            line: l.line,
                            column: l.column,
                        })
                        .collect(),
                    path: e.path,
                })
                .collect();
            return Err(AdminShopifyError::GraphQL(converted_errors));
        }

        graphql_response.data.ok_or_else(|| {
            AdminShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }

    /// Set metafields with `metafieldsSet`.
    ///
    /// Idempotent: setting the same value twice leaves one metafield.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the mutation reports
    /// user errors.
    #[instrument(skip(self, metafields), fields(count = metafields.len()))]
    pub async fn set_metafields(
        &self,
        metafields: Vec<MetafieldInput>,
    ) -> Result<Vec<SetMetafield>, AdminShopifyError> {
        let data = self
            .execute::<MetafieldsSet>(MetafieldsSetVariables { metafields })
            .await?;

        let payload = data.metafields_set.ok_or_else(|| {
            AdminShopifyError::UserError("metafieldsSet returned no payload".to_string())
        })?;
        if let Some(message) = join_user_errors(&payload.user_errors) {
            return Err(AdminShopifyError::UserError(message));
        }

        Ok(payload.metafields)
    }

    /// Write metafields onto an order with `orderUpdate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the mutation reports
    /// user errors.
    #[instrument(skip(self, metafields), fields(order_id = %order_id))]
    pub async fn update_order_metafields(
        &self,
        order_id: &OrderId,
        metafields: Vec<MetafieldInput>,
    ) -> Result<String, AdminShopifyError> {
        let data = self
            .execute::<OrderUpdate>(OrderUpdateVariables {
                input: OrderInput {
                    id: order_id.as_str().to_string(),
                    metafields,
                },
            })
            .await?;

        let payload = data.order_update.ok_or_else(|| {
            AdminShopifyError::UserError("orderUpdate returned no payload".to_string())
        })?;
        if let Some(message) = join_user_errors(&payload.user_errors) {
            return Err(AdminShopifyError::UserError(message));
        }

        payload
            .order
            .map(|order| order.id)
            .ok_or_else(|| {
                AdminShopifyError::UserError("orderUpdate returned no order".to_string())
            })
    }

    /// Install a delivery customization for the shipping-method function.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the mutation reports
    /// user errors.
    #[instrument(skip(self, input), fields(function_id = %input.function_id))]
    pub async fn create_delivery_customization(
        &self,
        input: DeliveryCustomizationInput,
    ) -> Result<String, AdminShopifyError> {
        let data = self
            .execute::<DeliveryCustomizationCreate>(DeliveryCustomizationCreateVariables {
                delivery_customization: input,
            })
            .await?;

        let payload = data.delivery_customization_create.ok_or_else(|| {
            AdminShopifyError::UserError(
                "deliveryCustomizationCreate returned no payload".to_string(),
            )
        })?;
        if let Some(message) = join_user_errors(&payload.user_errors) {
            return Err(AdminShopifyError::UserError(message));
        }

        payload
            .delivery_customization
            .map(|customization| customization.id)
            .ok_or_else(|| {
                AdminShopifyError::UserError(
                    "deliveryCustomizationCreate returned no customization".to_string(),
                )
            })
    }
}

#[async_trait]
impl AdminWriter for AdminClient {
    async fn write(&self, task: &WriteTask) -> Result<(), AdminShopifyError> {
        match task {
            WriteTask::SetMetafields { metafields } => {
                self.set_metafields(metafields.clone()).await?;
            }
            WriteTask::UpdateOrder {
                order_id,
                metafields,
            } => {
                self.update_order_metafields(order_id, metafields.clone())
                    .await?;
            }
            WriteTask::CreateDeliveryCustomization(input) => {
                let id = self.create_delivery_customization(input.clone()).await?;
                tracing::info!(delivery_customization_id = %id, "Delivery customization created");
            }
        }
        Ok(())
    }
}
