//! Metafield and note-attribute types shared by the write-back path.

use serde::{Deserialize, Serialize};

/// Namespace used for every order metafield this app writes.
pub const ORDER_METAFIELD_NAMESPACE: &str = "custom";

/// Order metafield key holding the customer-selected delivery date.
pub const DELIVERY_DATE_METAFIELD_KEY: &str = "dutchned_delivery_date";

/// Order metafield key holding the resolved shipping method.
pub const SHIPPING_METHOD_METAFIELD_KEY: &str = "shipping_method";

/// Metafield type for single-line text values.
pub const SINGLE_LINE_TEXT_FIELD: &str = "single_line_text_field";

/// Checkout attribute (order note attribute) carrying the selected date.
pub const DELIVERY_DATE_ATTRIBUTE: &str = "deliveryDate";

/// Namespace of the delivery customization's selector configuration.
pub const FUNCTION_CONFIG_NAMESPACE: &str = "$app:dutchned";

/// Key of the delivery customization's selector configuration.
pub const FUNCTION_CONFIG_KEY: &str = "function-configuration";

/// Metafield type for JSON values.
pub const JSON_FIELD: &str = "json";

/// Input for creating/updating metafields.
///
/// Serializes in the shape of the Admin API `MetafieldsSetInput`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetafieldInput {
    /// Owner resource GID. Omitted for nested inputs such as `OrderInput.metafields`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner_id: Option<String>,
    /// Namespace for the metafield.
    pub namespace: String,
    /// Key within the namespace.
    pub key: String,
    /// The value to store.
    pub value: String,
    /// The metafield type (e.g., `single_line_text_field`, `number_integer`).
    #[serde(rename = "type")]
    pub type_: String,
}

impl MetafieldInput {
    /// Build a single-line text metafield in the app's order namespace.
    #[must_use]
    pub fn order_text(owner_id: Option<String>, key: &str, value: impl Into<String>) -> Self {
        Self {
            owner_id,
            namespace: ORDER_METAFIELD_NAMESPACE.to_string(),
            key: key.to_string(),
            value: value.into(),
            type_: SINGLE_LINE_TEXT_FIELD.to_string(),
        }
    }

    /// Build the selector configuration metafield for a delivery customization.
    #[must_use]
    pub fn function_config(value: impl Into<String>) -> Self {
        Self {
            owner_id: None,
            namespace: FUNCTION_CONFIG_NAMESPACE.to_string(),
            key: FUNCTION_CONFIG_KEY.to_string(),
            value: value.into(),
            type_: JSON_FIELD.to_string(),
        }
    }
}

/// A `name`/`value` pair attached to a cart or order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAttribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value (Shopify sends `null` for cleared attributes).
    #[serde(default)]
    pub value: Option<String>,
}

/// Find the trimmed, non-empty value of the attribute called `name`.
#[must_use]
pub fn find_attribute<'a>(attributes: &'a [NoteAttribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|attr| attr.name == name)
        .and_then(|attr| attr.value.as_deref())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
