//! Input and output shapes of the delivery-customization function.
//!
//! Every field is defaulted so a partially populated input still
//! deserializes; missing data is treated as "ignore this input".

use serde::{Deserialize, Serialize};

use super::config::SelectorConfig;

/// Function input: `{cart: {lines, deliveryGroups}, deliveryCustomization?}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInput {
    #[serde(default)]
    pub cart: Cart,
    /// The customization owning this run; its metafield carries the config JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_customization: Option<DeliveryCustomization>,
}

impl FunctionInput {
    /// Resolve the selector configuration from the customization metafield.
    ///
    /// Missing or malformed configuration yields the defaults.
    #[must_use]
    pub fn config(&self) -> SelectorConfig {
        self.delivery_customization
            .as_ref()
            .and_then(|c| c.metafield.as_ref())
            .map(|m| SelectorConfig::from_json(&m.value))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub delivery_groups: Vec<DeliveryGroup>,
}

impl Cart {
    /// All delivery options across all groups, in input order.
    ///
    /// Options without a handle cannot be targeted and are skipped.
    pub fn delivery_options(&self) -> impl Iterator<Item = &DeliveryOption> {
        self.delivery_groups
            .iter()
            .flat_map(|group| group.delivery_options.iter())
            .filter(|option| !option.handle.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(default)]
    pub merchandise: Option<Merchandise>,
}

impl CartLine {
    /// Build a line whose product carries `value` in its priority metafield.
    #[must_use]
    pub fn with_metafield(value: impl Into<String>) -> Self {
        Self {
            merchandise: Some(Merchandise {
                product: Some(Product {
                    metafield: Some(MetafieldValue {
                        value: value.into(),
                    }),
                }),
            }),
        }
    }

    /// The product metafield value, if the line has one.
    #[must_use]
    pub fn metafield_value(&self) -> Option<&str> {
        self.merchandise
            .as_ref()?
            .product
            .as_ref()?
            .metafield
            .as_ref()
            .map(|m| m.value.as_str())
    }
}

/// Line merchandise. Only product variants carry a product; custom products
/// deserialize with `product: None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchandise {
    #[serde(default)]
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub metafield: Option<MetafieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetafieldValue {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCustomization {
    #[serde(default)]
    pub metafield: Option<MetafieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryGroup {
    #[serde(default)]
    pub delivery_options: Vec<DeliveryOption>,
}

/// A selectable shipping choice, e.g. `{handle: "abc", title: "2 - Express"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOption {
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl DeliveryOption {
    #[must_use]
    pub fn new(handle: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            title: Some(title.into()),
        }
    }

    /// Title, or the empty string when Shopify sent `null`.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }
}

/// Function output: the operations the checkout applies to its option list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionResult {
    pub operations: Vec<Operation>,
}

impl FunctionResult {
    /// The no-op result.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    /// Handles hidden by this result.
    pub fn hidden_handles(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Hide(hide) => Some(hide.delivery_option_handle.as_str()),
            Operation::Rename(_) => None,
        })
    }

    /// Rename operations in this result.
    pub fn renames(&self) -> impl Iterator<Item = &RenameOperation> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Rename(rename) => Some(rename),
            Operation::Hide(_) => None,
        })
    }
}

/// `{hide: {...}}` or `{rename: {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Hide(HideOperation),
    Rename(RenameOperation),
}

impl Operation {
    #[must_use]
    pub fn hide(handle: impl Into<String>) -> Self {
        Self::Hide(HideOperation {
            delivery_option_handle: handle.into(),
        })
    }

    #[must_use]
    pub fn rename(handle: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Rename(RenameOperation {
            delivery_option_handle: handle.into(),
            title: title.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HideOperation {
    pub delivery_option_handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameOperation {
    pub delivery_option_handle: String,
    pub title: String,
}
