//! Order-creation write-back.
//!
//! When Shopify reports a new order, two independent best-effort writes may
//! be queued:
//! - the customer's chosen delivery date (checkout attribute `deliveryDate`)
//!   as the order metafield `custom.dutchned_delivery_date`
//! - the highest-priority shipping method among the ordered products as
//!   `custom.shipping_method`
//!
//! Neither write can fail order processing. Their relative order is not
//! guaranteed.

use std::sync::Arc;

use dutchned_core::shipping::{CartLine, winning_priority};
use dutchned_core::{
    DELIVERY_DATE_ATTRIBUTE, DELIVERY_DATE_METAFIELD_KEY, MetafieldInput, NoteAttribute, OrderId,
    ProductId, SHIPPING_METHOD_METAFIELD_KEY, find_attribute,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::services::write_queue::{TaskSink, WriteTask};
use crate::store::ShippingMethodStore;

/// The parts of an `orders/create` webhook payload this app reads.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderCreated {
    /// REST id of the order.
    pub id: u64,
    #[serde(default)]
    pub admin_graphql_api_id: Option<String>,
    /// Display name, e.g. `#1001`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub note_attributes: Vec<NoteAttribute>,
    /// Kept raw; individual items are read leniently.
    #[serde(default)]
    pub line_items: Value,
}

impl OrderCreated {
    /// GraphQL id of the order.
    #[must_use]
    pub fn order_id(&self) -> OrderId {
        self.admin_graphql_api_id
            .as_deref()
            .and_then(OrderId::parse)
            .unwrap_or_else(|| OrderId::from_numeric(self.id))
    }

    /// Selected delivery date from the checkout attributes.
    #[must_use]
    pub fn delivery_date(&self) -> Option<&str> {
        find_attribute(&self.note_attributes, DELIVERY_DATE_ATTRIBUTE)
    }

    /// Product ids of the line items, in order, without duplicates.
    ///
    /// Items without a product (custom items, gift cards) are skipped.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let Some(items) = self.line_items.as_array() else {
            return Vec::new();
        };

        let mut ids: Vec<ProductId> = Vec::new();
        for item in items {
            let id = match item.get("product_id") {
                Some(Value::Number(n)) => n.as_u64().map(ProductId::from_numeric),
                Some(Value::String(s)) => ProductId::parse(s),
                _ => None,
            };
            match id {
                Some(id) if !ids.contains(&id) => ids.push(id),
                Some(_) => {}
                None => debug!(order_id = self.id, "Skipping line item without a product"),
            }
        }
        ids
    }
}

/// What [`OrderWriteBack::on_order_created`] submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBackReport {
    /// Delivery date written to the order, if any.
    pub delivery_date: Option<String>,
    /// Shipping-method label written to the order, if any.
    pub shipping_method: Option<String>,
}

impl WriteBackReport {
    /// Number of write tasks submitted.
    #[must_use]
    pub fn submitted(&self) -> usize {
        usize::from(self.delivery_date.is_some()) + usize::from(self.shipping_method.is_some())
    }
}

/// Queues order metafield writes for new orders.
#[derive(Clone)]
pub struct OrderWriteBack {
    sink: Arc<dyn TaskSink>,
    store: Arc<dyn ShippingMethodStore>,
}

impl OrderWriteBack {
    #[must_use]
    pub fn new(sink: Arc<dyn TaskSink>, store: Arc<dyn ShippingMethodStore>) -> Self {
        Self { sink, store }
    }

    /// Queue the write-backs for a newly created order.
    ///
    /// Never fails: store errors are logged and the affected write skipped.
    #[instrument(skip(self, order), fields(order_id = order.id, order_name = order.name.as_deref()))]
    pub async fn on_order_created(&self, order: &OrderCreated) -> WriteBackReport {
        let order_id = order.order_id();
        let mut report = WriteBackReport::default();

        if let Some(date) = order.delivery_date() {
            self.sink.submit(WriteTask::SetMetafields {
                metafields: vec![MetafieldInput::order_text(
                    Some(order_id.as_str().to_string()),
                    DELIVERY_DATE_METAFIELD_KEY,
                    date,
                )],
            });
            info!(delivery_date = date, "Queued delivery date write-back");
            report.delivery_date = Some(date.to_string());
        } else {
            debug!("Order has no delivery date attribute");
        }

        if let Some(label) = self.resolve_shipping_method(order).await {
            self.sink.submit(WriteTask::UpdateOrder {
                order_id,
                metafields: vec![MetafieldInput::order_text(
                    None,
                    SHIPPING_METHOD_METAFIELD_KEY,
                    label.clone(),
                )],
            });
            info!(shipping_method = %label, "Queued shipping method write-back");
            report.shipping_method = Some(label);
        }

        report
    }

    /// Highest-priority label among the order's products; ties keep the
    /// first line item.
    async fn resolve_shipping_method(&self, order: &OrderCreated) -> Option<String> {
        let mut lines = Vec::new();
        for product_id in order.product_ids() {
            match self.store.get(&product_id).await {
                Ok(Some(label)) => lines.push(CartLine::with_metafield(label)),
                Ok(None) => {}
                Err(e) => {
                    error!(product_id = %product_id, error = %e, "Shipping method lookup failed");
                }
            }
        }

        let winner = winning_priority(&lines);
        if winner.is_none() && !lines.is_empty() {
            warn!("No shipping method label carries a valid priority");
        }
        winner.map(|w| w.raw.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::InMemoryShippingMethodStore;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<WriteTask>>);

    impl TaskSink for RecordingSink {
        fn submit(&self, task: WriteTask) {
            self.0.lock().unwrap().push(task);
        }
    }

    fn order(payload: Value) -> OrderCreated {
        serde_json::from_value(payload).unwrap()
    }

    fn write_back(labels: &[(u64, &str)]) -> (OrderWriteBack, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let store = InMemoryShippingMethodStore::with_entries(
            labels
                .iter()
                .map(|(id, label)| (ProductId::from_numeric(*id), (*label).to_string())),
        );
        (OrderWriteBack::new(sink.clone(), Arc::new(store)), sink)
    }

    #[tokio::test]
    async fn test_delivery_date_submits_one_metafield_write() {
        let (write_back, sink) = write_back(&[]);
        let report = write_back
            .on_order_created(&order(json!({
                "id": 1001,
                "note_attributes": [{"name": "deliveryDate", "value": "2024-05-01"}],
                "line_items": []
            })))
            .await;

        assert_eq!(report.delivery_date.as_deref(), Some("2024-05-01"));
        assert_eq!(report.submitted(), 1);

        let tasks = sink.0.lock().unwrap();
        assert_eq!(tasks.len(), 1);
        let WriteTask::SetMetafields { metafields } = &tasks[0] else {
            panic!("expected a metafieldsSet task");
        };
        assert_eq!(metafields.len(), 1);
        assert_eq!(metafields[0].value, "2024-05-01");
        assert_eq!(metafields[0].key, "dutchned_delivery_date");
        assert_eq!(metafields[0].owner_id.as_deref(), Some("gid://shopify/Order/1001"));
    }

    #[tokio::test]
    async fn test_missing_delivery_date_submits_nothing() {
        let (write_back, sink) = write_back(&[]);
        let report = write_back
            .on_order_created(&order(json!({
                "id": 1002,
                "note_attributes": [{"name": "deliveryDate", "value": "  "}]
            })))
            .await;

        assert_eq!(report, WriteBackReport::default());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_highest_priority_shipping_method() {
        let (write_back, sink) = write_back(&[
            (1, "1 - standard"),
            (2, "3 - same day"),
            (3, "2 - express"),
        ]);
        let report = write_back
            .on_order_created(&order(json!({
                "id": 1003,
                "admin_graphql_api_id": "gid://shopify/Order/1003",
                "line_items": [
                    {"product_id": 1},
                    {"product_id": 2},
                    {"product_id": null},
                    {"product_id": 3}
                ]
            })))
            .await;

        assert_eq!(report.shipping_method.as_deref(), Some("3 - same day"));
        let tasks = sink.0.lock().unwrap();
        assert_eq!(tasks.len(), 1);
        let WriteTask::UpdateOrder {
            order_id,
            metafields,
        } = &tasks[0]
        else {
            panic!("expected an orderUpdate task");
        };
        assert_eq!(order_id.as_str(), "gid://shopify/Order/1003");
        assert_eq!(metafields[0].key, "shipping_method");
        assert_eq!(metafields[0].value, "3 - same day");
        assert_eq!(metafields[0].owner_id, None);
    }

    #[tokio::test]
    async fn test_both_writes_submitted() {
        let (write_back, sink) = write_back(&[(5, "2 - express")]);
        let report = write_back
            .on_order_created(&order(json!({
                "id": 1004,
                "note_attributes": [{"name": "deliveryDate", "value": "2024-05-02"}],
                "line_items": [{"product_id": "5"}]
            })))
            .await;

        assert_eq!(report.submitted(), 2);
        assert_eq!(sink.0.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_labels_without_priority_are_ignored() {
        let (write_back, sink) = write_back(&[(1, "express")]);
        let report = write_back
            .on_order_created(&order(json!({
                "id": 1005,
                "line_items": [{"product_id": 1}]
            })))
            .await;

        assert_eq!(report.shipping_method, None);
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_product_ids_deduplicated() {
        let order = order(json!({
            "id": 1,
            "line_items": [{"product_id": 9}, {"product_id": 9}, {"title": "Tip"}]
        }));
        assert_eq!(order.product_ids(), vec![ProductId::from_numeric(9)]);
    }

    #[test]
    fn test_order_id_falls_back_to_rest_id() {
        let order = order(json!({"id": 42, "admin_graphql_api_id": "gid://shopify/Product/42"}));
        assert_eq!(order.order_id(), OrderId::from_numeric(42));
    }
}
