//! GraphQL operations sent to the Shopify Admin API.
//!
//! Each operation implements `graphql_client::GraphQLQuery` over hand-written
//! variable and response types, so the client can stay generic over them.

use dutchned_core::MetafieldInput;
use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

const METAFIELDS_SET: &str = r"
mutation MetafieldsSet($metafields: [MetafieldsSetInput!]!) {
  metafieldsSet(metafields: $metafields) {
    metafields { id namespace key value }
    userErrors { field message }
  }
}
";

const ORDER_UPDATE: &str = r"
mutation OrderUpdate($input: OrderInput!) {
  orderUpdate(input: $input) {
    order { id }
    userErrors { field message }
  }
}
";

const DELIVERY_CUSTOMIZATION_CREATE: &str = r"
mutation DeliveryCustomizationCreate($deliveryCustomization: DeliveryCustomizationInput!) {
  deliveryCustomizationCreate(deliveryCustomization: $deliveryCustomization) {
    deliveryCustomization { id }
    userErrors { field message }
  }
}
";

/// A `userErrors` entry from a mutation payload.
#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Join user errors into one message, `None` when there are none.
pub(super) fn join_user_errors(errors: &[UserError]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| match &e.field {
                Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), e.message),
                _ => e.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeId {
    pub id: String,
}

// =============================================================================
// metafieldsSet
// =============================================================================

pub struct MetafieldsSet;

#[derive(Debug, Serialize)]
pub struct MetafieldsSetVariables {
    pub metafields: Vec<MetafieldInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetafieldsSetData {
    pub metafields_set: Option<MetafieldsSetPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetafieldsSetPayload {
    #[serde(default)]
    pub metafields: Vec<SetMetafield>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetMetafield {
    pub id: String,
    pub namespace: String,
    pub key: String,
    pub value: String,
}

impl GraphQLQuery for MetafieldsSet {
    type Variables = MetafieldsSetVariables;
    type ResponseData = MetafieldsSetData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: METAFIELDS_SET,
            operation_name: "MetafieldsSet",
        }
    }
}

// =============================================================================
// orderUpdate
// =============================================================================

pub struct OrderUpdate;

/// `OrderInput` restricted to what this app writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderInput {
    pub id: String,
    pub metafields: Vec<MetafieldInput>,
}

#[derive(Debug, Serialize)]
pub struct OrderUpdateVariables {
    pub input: OrderInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdateData {
    pub order_update: Option<OrderUpdatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdatePayload {
    pub order: Option<NodeId>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

impl GraphQLQuery for OrderUpdate {
    type Variables = OrderUpdateVariables;
    type ResponseData = OrderUpdateData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: ORDER_UPDATE,
            operation_name: "OrderUpdate",
        }
    }
}

// =============================================================================
// deliveryCustomizationCreate
// =============================================================================

pub struct DeliveryCustomizationCreate;

/// Delivery customization pointing at the shipping-method function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCustomizationInput {
    pub function_id: String,
    pub title: String,
    pub enabled: bool,
    pub metafields: Vec<MetafieldInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCustomizationCreateVariables {
    pub delivery_customization: DeliveryCustomizationInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCustomizationCreateData {
    pub delivery_customization_create: Option<DeliveryCustomizationCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCustomizationCreatePayload {
    pub delivery_customization: Option<NodeId>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

impl GraphQLQuery for DeliveryCustomizationCreate {
    type Variables = DeliveryCustomizationCreateVariables;
    type ResponseData = DeliveryCustomizationCreateData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: DELIVERY_CUSTOMIZATION_CREATE,
            operation_name: "DeliveryCustomizationCreate",
        }
    }
}
