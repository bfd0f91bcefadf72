use serde::{Deserialize, Serialize};
use sfp_common::Money;

use crate::db_types::Order;

/// An order line re-hydrated with catalogue details, ready to be shown to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    /// The product name, or the product id if the product is no longer in the catalogue.
    pub name: String,
    pub sku: Option<String>,
    pub quantity: i64,
    pub price: Money,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// Emitted once when an order moves into `paid` from any other status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl OrderPaidEvent {
    pub fn new(order: Order, lines: Vec<OrderLine>) -> Self {
        Self { order, lines }
    }
}
