//! #  Database management and control.
//!
//! This module defines the interface contracts that a storage backend must honour to be used by the storefront engine.
//!
//! * [`StorefrontDatabase`] defines the write side: inserting orders, applying conditional order updates and deleting
//!   orders together with their line items.
//! * [`OrderManagement`] defines read-only queries over orders, their items and the product catalogue.
mod data_objects;
mod order_management;
mod storefront_database;

pub use data_objects::{OrderSearchFilter, Pagination, DEFAULT_PAGE_SIZE, MAX_PAGE, MAX_PAGE_SIZE};
pub use order_management::OrderManagement;
pub use storefront_database::{StorefrontDatabase, StorefrontDbError};
