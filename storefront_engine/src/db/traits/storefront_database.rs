use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderUpdate, Product},
    traits::OrderManagement,
};

/// This trait defines the highest level of behaviour for backends supporting the storefront engine.
///
/// This behaviour includes:
/// * Storing new orders and their line items
/// * Maintaining the product catalogue used to describe order lines
/// * Applying order updates atomically, guarded by the status the caller last observed
/// * Deleting orders along with their line items
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order and its line items in a single transaction.
    ///
    /// Fails with [`StorefrontDbError::OrderAlreadyExists`] if the id or order number is taken.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StorefrontDbError>;

    /// Inserts the product, or replaces the stored name, sku and price if it already exists.
    async fn upsert_product(&self, product: Product) -> Result<(), StorefrontDbError>;

    /// Applies `update` only if the stored status still equals `update.expected_status`.
    ///
    /// Returns the updated order, or `None` if the order is missing or its status was changed by another writer since
    /// it was read.
    async fn update_order(&self, update: OrderUpdate) -> Result<Option<Order>, StorefrontDbError>;

    /// Deletes the order's line items and then the order itself, atomically. Returns false if there was no such order.
    async fn delete_order(&self, id: &str) -> Result<bool, StorefrontDbError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StorefrontDbError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum StorefrontDbError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists: {0}")]
    OrderAlreadyExists(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(String),
}

impl From<sqlx::Error> for StorefrontDbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StorefrontDbError::OrderAlreadyExists(db.message().to_string())
            },
            e => StorefrontDbError::DatabaseError(e.to_string()),
        }
    }
}
