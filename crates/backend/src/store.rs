//! Per-product shipping-method labels.
//!
//! The label is the same string the product metafield carries, e.g.
//! `"2 - express delivery"`: a leading priority followed by a display name.
//! The store is injected through [`AppState`](crate::state::AppState) so the
//! in-memory default can be swapped for a persistent one.

use std::collections::HashMap;

use async_trait::async_trait;
use dutchned_core::ProductId;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors from a shipping-method store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// A product's configured shipping method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethodEntry {
    pub product_id: ProductId,
    pub label: String,
}

/// Storage for product → shipping-method label.
#[async_trait]
pub trait ShippingMethodStore: Send + Sync {
    /// Label for `product_id`, if configured.
    async fn get(&self, product_id: &ProductId) -> Result<Option<String>, StoreError>;

    /// Set the label for `product_id`, returning the previous one.
    async fn set(&self, product_id: ProductId, label: String)
    -> Result<Option<String>, StoreError>;

    /// Remove the label for `product_id`, returning it.
    async fn remove(&self, product_id: &ProductId) -> Result<Option<String>, StoreError>;

    /// Every entry, ordered by product id.
    async fn list(&self) -> Result<Vec<ShippingMethodEntry>, StoreError>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryShippingMethodStore {
    entries: RwLock<HashMap<ProductId, String>>,
}

impl InMemoryShippingMethodStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = (ProductId, String)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }
}

#[async_trait]
impl ShippingMethodStore for InMemoryShippingMethodStore {
    async fn get(&self, product_id: &ProductId) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(product_id).cloned())
    }

    async fn set(
        &self,
        product_id: ProductId,
        label: String,
    ) -> Result<Option<String>, StoreError> {
        Ok(self.entries.write().await.insert(product_id, label))
    }

    async fn remove(&self, product_id: &ProductId) -> Result<Option<String>, StoreError> {
        Ok(self.entries.write().await.remove(product_id))
    }

    async fn list(&self) -> Result<Vec<ShippingMethodEntry>, StoreError> {
        let mut entries: Vec<ShippingMethodEntry> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(product_id, label)| ShippingMethodEntry {
                product_id: product_id.clone(),
                label: label.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        Ok(entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = InMemoryShippingMethodStore::new();
        let product = ProductId::from_numeric(7);

        assert_eq!(store.get(&product).await.unwrap(), None);
        assert_eq!(
            store.set(product.clone(), "1 - standard".to_string()).await.unwrap(),
            None
        );
        assert_eq!(
            store.set(product.clone(), "2 - express".to_string()).await.unwrap(),
            Some("1 - standard".to_string())
        );
        assert_eq!(
            store.get(&product).await.unwrap().as_deref(),
            Some("2 - express")
        );
        assert_eq!(
            store.remove(&product).await.unwrap().as_deref(),
            Some("2 - express")
        );
        assert_eq!(store.get(&product).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let store = InMemoryShippingMethodStore::with_entries([
            (ProductId::from_numeric(2), "2 - express".to_string()),
            (ProductId::from_numeric(1), "1 - standard".to_string()),
        ]);
        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.product_id.as_str().to_string())
            .collect();
        assert_eq!(
            ids,
            vec!["gid://shopify/Product/1", "gid://shopify/Product/2"]
        );
    }
}
