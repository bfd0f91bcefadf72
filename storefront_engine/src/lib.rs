//! Storefront Engine
//!
//! The storefront engine holds the order state for the storefront and the rules for changing it. It is
//! provider-agnostic: payment provider integrations translate their notifications into a [`PaymentNotification`]
//! and hand it to the engine.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@traits`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`OrderFlowApi`] and [`OrdersApi`]). `OrderFlowApi` applies payment notifications and
//!    admin status changes through a single conditional transition, and `OrdersApi` serves the admin order listing.
//!
//! The engine also emits events that can be subscribed to. When an order moves into `paid`, an `OrderPaidEvent` is
//! published with the order lines attached, so that for example a confirmation email can be sent.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
mod sfe_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits;
pub use sfe_api::{
    errors::{OrderApiError, ReconcileError},
    order_flow_api::OrderFlowApi,
    order_objects,
    order_objects::{OrderChanged, PaymentNotification, ReconcileOutcome},
    orders_api::OrdersApi,
};
pub use traits::{OrderManagement, StorefrontDatabase, StorefrontDbError};
