use crate::{
    db_types::{Order, OrderItem, Product},
    traits::{OrderSearchFilter, Pagination, StorefrontDbError},
};

/// The `OrderManagement` trait defines the behaviour for querying information about orders in the database backend.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with the given opaque id.
    async fn fetch_order(&self, id: &str) -> Result<Option<Order>, StorefrontDbError>;

    /// Resolves a correlation id to an order. The order `id` is tried first, then the `order_number`.
    async fn fetch_order_by_id_or_number(&self, key: &str) -> Result<Option<Order>, StorefrontDbError>;

    async fn fetch_items_for_order(&self, order_id: &str) -> Result<Vec<OrderItem>, StorefrontDbError>;

    /// Fetches the line items of all the given orders in one query.
    async fn fetch_items_for_orders(&self, order_ids: &[String]) -> Result<Vec<OrderItem>, StorefrontDbError>;

    /// Batch lookup of products by id. Unknown ids are silently absent from the result.
    async fn fetch_products(&self, product_ids: &[String]) -> Result<Vec<Product>, StorefrontDbError>;

    /// Returns one page of orders matching `filter`, newest first, along with the total number of matches.
    async fn search_orders(
        &self,
        filter: OrderSearchFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Order>, i64), StorefrontDbError>;
}
