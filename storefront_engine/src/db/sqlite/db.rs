use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{db_url, new_pool, order_items, orders, products};
use crate::{
    db_types::{NewOrder, Order, OrderItem, OrderUpdate, Product},
    traits::{OrderManagement, OrderSearchFilter, Pagination, StorefrontDatabase, StorefrontDbError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from `SFP_DATABASE_URL`, or the default if it is not set.
    pub async fn new(max_connections: u32) -> Result<Self, StorefrontDbError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StorefrontDbError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Migrations that have already been applied are skipped.
    pub async fn migrate(&self) -> Result<(), StorefrontDbError> {
        sqlx::migrate!("./src/db/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorefrontDbError::DatabaseError(format!("Migration failed. {e}")))?;
        debug!("🗃️ Database schema at {} is up to date", self.url);
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, id: &str) -> Result<Option<Order>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(id, &mut conn).await
    }

    async fn fetch_order_by_id_or_number(&self, key: &str) -> Result<Option<Order>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        match orders::fetch_order(key, &mut conn).await? {
            Some(order) => Ok(Some(order)),
            None => {
                trace!("🗃️ No order with id {key}. Trying it as an order number");
                orders::fetch_order_by_order_number(key, &mut conn).await
            },
        }
    }

    async fn fetch_items_for_order(&self, order_id: &str) -> Result<Vec<OrderItem>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        order_items::fetch_items_for_order(order_id, &mut conn).await
    }

    async fn fetch_items_for_orders(&self, order_ids: &[String]) -> Result<Vec<OrderItem>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        order_items::fetch_items_for_orders(order_ids, &mut conn).await
    }

    async fn fetch_products(&self, product_ids: &[String]) -> Result<Vec<Product>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_products(product_ids, &mut conn).await
    }

    async fn search_orders(
        &self,
        filter: OrderSearchFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Order>, i64), StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(&filter, pagination, &mut conn).await
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StorefrontDbError> {
        let mut tx = self.pool.begin().await?;
        orders::insert_order(&order, &mut tx).await?;
        order_items::insert_items(&order.id, &order.items, &mut tx).await?;
        let saved = orders::fetch_order(&order.id, &mut tx)
            .await?
            .ok_or_else(|| StorefrontDbError::OrderNotFound(order.id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {} stored with {} line items", saved.id, order.items.len());
        Ok(saved)
    }

    async fn upsert_product(&self, product: Product) -> Result<(), StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        products::upsert_product(product, &mut conn).await
    }

    async fn update_order(&self, update: OrderUpdate) -> Result<Option<Order>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order(&update, &mut conn).await
    }

    async fn delete_order(&self, id: &str) -> Result<bool, StorefrontDbError> {
        let mut tx = self.pool.begin().await?;
        let items = order_items::delete_items_for_order(id, &mut tx).await?;
        let deleted = orders::delete_order(id, &mut tx).await?;
        if !deleted {
            debug!("🗃️ Order {id} does not exist. Nothing to delete");
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        info!("🗃️ Order {id} and its {items} line items have been deleted");
        Ok(true)
    }

    async fn close(&mut self) -> Result<(), StorefrontDbError> {
        self.pool.close().await;
        Ok(())
    }
}
