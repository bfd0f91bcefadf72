//! Read access to orders for the admin order listing.
use std::{collections::HashMap, fmt::Debug};

use log::trace;

use crate::{
    db_types::OrderItem,
    order_objects::{OrderPage, OrderWithItems},
    sfe_api::errors::OrderApiError,
    traits::{OrderManagement, OrderSearchFilter, Pagination},
};

pub struct OrdersApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrdersApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrdersApi ({:?})", self.db)
    }
}

impl<B> OrdersApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches one page of orders, newest first, each with its line items.
    pub async fn search_orders(
        &self,
        filter: OrderSearchFilter,
        pagination: Pagination,
    ) -> Result<OrderPage, OrderApiError> {
        let (orders, total) = self.db.search_orders(filter, pagination).await?;
        let ids = orders.iter().map(|o| o.id.clone()).collect::<Vec<_>>();
        let mut items_by_order = self.db.fetch_items_for_orders(&ids).await?.into_iter().fold(
            HashMap::<String, Vec<OrderItem>>::new(),
            |mut map, item| {
                map.entry(item.order_id.clone()).or_default().push(item);
                map
            },
        );
        let orders = orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect::<Vec<_>>();
        trace!("📦️ Returning {} of {total} orders (page {})", orders.len(), pagination.page());
        Ok(OrderPage { orders, total, page: pagination.page(), total_pages: pagination.total_pages(total) })
    }

    pub async fn fetch_order(&self, order_id: &str) -> Result<OrderWithItems, OrderApiError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| OrderApiError::OrderNotFound(order_id.to_string()))?;
        let items = self.db.fetch_items_for_order(order_id).await?;
        Ok(OrderWithItems { order, items })
    }
}
