//! # Storefront engine public API
//!
//! The `sfe_api` module exposes the programmatic API of the storefront engine.
//!
//! * [`order_flow_api`] is the write side. It reconciles payment notifications onto orders and applies admin status
//!   changes. Both paths go through one transition function, which is also where the `OrderPaidEvent` is raised.
//! * [`orders_api`] provides read access for the admin order listing.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API needs.
//!
//! ```rust,ignore
//! use storefront_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/storefront.db", 5).await?;
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let outcome = api.modify_status_for_order("ord_123", OrderStatusType::Shipped).await?;
//! ```
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod orders_api;
