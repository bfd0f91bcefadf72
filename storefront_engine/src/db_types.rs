use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sfp_common::{Money, DEFAULT_CURRENCY_CODE};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

use crate::helpers::{generate_order_number, new_order_id};

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order was placed at checkout and no payment has been confirmed yet.
    Pending,
    /// Payment has been confirmed by an admin.
    Paid,
    /// The payment provider reported a completed payment and the order is being prepared.
    Processing,
    Shipped,
    Delivered,
    /// The order was cancelled, or its payment failed, was denied, expired, refunded or reversed.
    Cancelled,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 6] =
        [Self::Pending, Self::Paid, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to pending");
            OrderStatusType::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    ShippingAddress    ---------------------------------------------------------
/// Where the order ships to. Keys the storefront stores that are not modelled here are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub email: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Field-wise merge where a non-empty value in `patch` wins, otherwise the existing value is kept.
fn pick(patch: &str, existing: &str) -> String {
    if patch.is_empty() {
        existing.to_string()
    } else {
        patch.to_string()
    }
}

impl ShippingAddress {
    /// Merges `patch` into this address. Unmodelled keys are preserved from `self`.
    pub fn merge(&self, patch: &ShippingAddress) -> ShippingAddress {
        ShippingAddress {
            email: pick(&patch.email, &self.email),
            name: pick(&patch.name, &self.name),
            first_name: pick(&patch.first_name, &self.first_name),
            last_name: pick(&patch.last_name, &self.last_name),
            address1: pick(&patch.address1, &self.address1),
            address2: pick(&patch.address2, &self.address2),
            city: pick(&patch.city, &self.city),
            state: pick(&patch.state, &self.state),
            zip: pick(&patch.zip, &self.zip),
            country: pick(&patch.country, &self.country),
            phone: pick(&patch.phone, &self.phone),
            extra: self.extra.clone(),
        }
    }

    pub fn full_name(&self) -> String {
        let joined = format!("{} {}", self.first_name, self.last_name).trim().to_string();
        if joined.is_empty() {
            self.name.clone()
        } else {
            joined
        }
    }
}

//--------------------------------------    BillingAddress     ---------------------------------------------------------
/// Payer details reported by the payment provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillingAddress {
    pub payer_id: String,
    pub payer_email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub txn_id: String,
    pub payment_status: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BillingAddress {
    pub fn merge(&self, patch: &BillingAddress) -> BillingAddress {
        BillingAddress {
            payer_id: pick(&patch.payer_id, &self.payer_id),
            payer_email: pick(&patch.payer_email, &self.payer_email),
            first_name: pick(&patch.first_name, &self.first_name),
            last_name: pick(&patch.last_name, &self.last_name),
            phone: pick(&patch.phone, &self.phone),
            txn_id: pick(&patch.txn_id, &self.txn_id),
            payment_status: pick(&patch.payment_status, &self.payment_status),
            extra: self.extra.clone(),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatusType,
    pub total: Money,
    pub currency: String,
    pub discount: Money,
    pub coupon_code: Option<String>,
    pub shipping_address: ShippingAddress,
    pub billing_address: BillingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row representation of [`Order`]. Addresses are stored as JSON text.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct OrderRow {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatusType,
    pub total: Money,
    pub currency: String,
    pub discount: Money,
    pub coupon_code: Option<String>,
    pub shipping_address: Json<ShippingAddress>,
    pub billing_address: Json<BillingAddress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            status: row.status,
            total: row.total,
            currency: row.currency,
            discount: row.discount,
            coupon_code: row.coupon_code,
            shipping_address: row.shipping_address.0,
            billing_address: row.billing_address.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Order {} (#{}) [{}] total {} {}",
            self.id, self.order_number, self.status, self.total, self.currency
        )
    }
}

//--------------------------------------      OrderItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub price: Money,
}

impl NewOrderItem {
    pub fn new<S: Into<String>>(product_id: S, quantity: i64, price: Money) -> Self {
        Self { product_id: product_id.into(), quantity, price }
    }
}

//--------------------------------------       Product         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: Option<String>,
    pub price: Money,
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatusType,
    pub total: Money,
    pub currency: String,
    pub discount: Money,
    pub coupon_code: Option<String>,
    pub shipping_address: ShippingAddress,
    pub items: Vec<NewOrderItem>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// A pending order with a freshly generated id and order number. The total is the sum of the line prices.
    pub fn new(items: Vec<NewOrderItem>) -> Self {
        let now = Utc::now();
        let total = items.iter().map(|i| i.price * i.quantity).sum();
        Self {
            id: new_order_id(),
            order_number: generate_order_number(now),
            status: OrderStatusType::Pending,
            total,
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            discount: Money::default(),
            coupon_code: None,
            shipping_address: ShippingAddress::default(),
            items,
            created_at: now,
        }
    }

    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_order_number<S: Into<String>>(mut self, order_number: S) -> Self {
        self.order_number = order_number.into();
        self
    }

    pub fn with_discount(mut self, discount: Money, coupon_code: Option<String>) -> Self {
        self.discount = discount;
        self.coupon_code = coupon_code;
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = status;
        self
    }

    pub fn with_shipping_address(mut self, address: ShippingAddress) -> Self {
        self.shipping_address = address;
        self
    }
}

//--------------------------------------      OrderUpdate      ---------------------------------------------------------
/// A conditional write: the update only applies while the stored status still equals `expected_status`.
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    pub order_id: String,
    pub expected_status: OrderStatusType,
    pub status: OrderStatusType,
    pub shipping_address: ShippingAddress,
    pub billing_address: BillingAddress,
}

impl OrderUpdate {
    /// True if applying this update to `order` would change nothing.
    pub fn is_noop_for(&self, order: &Order) -> bool {
        self.status == order.status &&
            self.shipping_address == order.shipping_address &&
            self.billing_address == order.billing_address
    }
}
