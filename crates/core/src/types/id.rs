//! Newtype Shopify global IDs for type-safe resource references.
//!
//! Use the `define_gid!` macro to create wrappers that prevent accidentally
//! passing a product GID where an order GID is expected.

/// Macro to define a type-safe Shopify GID wrapper.
///
/// Creates a newtype wrapper around `String` holding a value of the form
/// `gid://shopify/<Resource>/<numeric id>` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `from_numeric()`, `parse()`, `as_str()`, `numeric_id()`
///
/// # Example
///
/// ```rust
/// # use dutchned_core::define_gid;
/// define_gid!(OrderId, "Order");
/// define_gid!(ProductId, "Product");
///
/// let order = OrderId::from_numeric(1001);
/// assert_eq!(order.as_str(), "gid://shopify/Order/1001");
///
/// // Wrong resource type is rejected
/// assert!(ProductId::parse("gid://shopify/Order/1001").is_none());
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Shopify resource name encoded in the GID.
            pub const RESOURCE: &'static str = $resource;

            /// Build a GID from a numeric REST id.
            #[must_use]
            pub fn from_numeric(id: u64) -> Self {
                Self(format!("gid://shopify/{}/{id}", $resource))
            }

            /// Parse either a full GID of the right resource or a bare numeric id.
            #[must_use]
            pub fn parse(value: &str) -> Option<Self> {
                let value = value.trim();
                if let Ok(id) = value.parse::<u64>() {
                    return Some(Self::from_numeric(id));
                }
                let prefix = concat!("gid://shopify/", $resource, "/");
                let rest = value.strip_prefix(prefix)?;
                let numeric = rest.split('?').next()?;
                numeric.parse::<u64>().ok().map(Self::from_numeric)
            }

            /// Get the GID string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Get the numeric id at the end of the GID.
            #[must_use]
            pub fn numeric_id(&self) -> Option<u64> {
                self.0.rsplit('/').next()?.parse().ok()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_gid!(OrderId, "Order");
define_gid!(ProductId, "Product");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_numeric() {
        let id = OrderId::from_numeric(42);
        assert_eq!(id.as_str(), "gid://shopify/Order/42");
        assert_eq!(id.numeric_id(), Some(42));
    }

    #[test]
    fn test_parse_accepts_bare_numeric() {
        assert_eq!(
            ProductId::parse(" 7 "),
            Some(ProductId::from_numeric(7))
        );
    }

    #[test]
    fn test_parse_rejects_other_resource() {
        assert!(OrderId::parse("gid://shopify/Product/7").is_none());
        assert!(OrderId::parse("gid://shopify/Order/abc").is_none());
        assert!(OrderId::parse("").is_none());
    }

    #[test]
    fn test_serde_transparent() {
        let id = ProductId::from_numeric(9);
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"gid://shopify/Product/9\"");
    }
}
