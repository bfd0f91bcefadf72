use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{BillingAddress, Order, OrderItem, OrderStatusType, Product, ShippingAddress},
    events::OrderLine,
};

/// A payment event reported by the payment provider, already translated into storefront terms.
#[derive(Debug, Clone, Default)]
pub struct PaymentNotification {
    /// The order id or order number the payer was sent with. Blank values count as absent.
    pub correlation_id: Option<String>,
    /// The status string exactly as the provider sent it, used in logs and error messages.
    pub provider_status: String,
    /// The order status the provider status maps onto, or `None` if the provider status is not recognised.
    pub new_status: Option<OrderStatusType>,
    /// Shipping fields supplied with the notification. Empty fields leave the stored value alone.
    pub shipping: ShippingAddress,
    /// Payer fields supplied with the notification. Empty fields leave the stored value alone.
    pub billing: BillingAddress,
}

impl PaymentNotification {
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChanged {
    pub old_order: Order,
    pub new_order: Order,
}

impl OrderChanged {
    pub fn new(old_order: Order, new_order: Order) -> Self {
        Self { old_order, new_order }
    }
}

/// The result of a transition that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The order was written. Both snapshots are included.
    Updated(OrderChanged),
    /// The stored order already matched the requested state, so nothing was written.
    AlreadyApplied(Order),
}

impl ReconcileOutcome {
    /// The order as it is now stored.
    pub fn order(&self) -> &Order {
        match self {
            ReconcileOutcome::Updated(change) => &change.new_order,
            ReconcileOutcome::AlreadyApplied(order) => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            ReconcileOutcome::Updated(change) => change.new_order,
            ReconcileOutcome::AlreadyApplied(order) => order,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, ReconcileOutcome::Updated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// One page of the admin order listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<OrderWithItems>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

/// Pairs order items with catalogue entries. Items whose product is gone are described by their product id.
pub fn order_lines(items: &[OrderItem], products: &[Product]) -> Vec<OrderLine> {
    let catalogue = products.iter().map(|p| (p.id.as_str(), p)).collect::<HashMap<_, _>>();
    items
        .iter()
        .map(|item| {
            let product = catalogue.get(item.product_id.as_str());
            OrderLine {
                product_id: item.product_id.clone(),
                name: product.map(|p| p.name.clone()).unwrap_or_else(|| item.product_id.clone()),
                sku: product.and_then(|p| p.sku.clone()),
                quantity: item.quantity,
                price: item.price,
            }
        })
        .collect()
}
