use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrderItem, OrderItem},
    traits::StorefrontDbError,
};

/// Inserts the line items for an order. This is not atomic; run it inside the transaction that inserts the order.
pub async fn insert_items(
    order_id: &str,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<(), StorefrontDbError> {
    if items.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new("INSERT INTO order_items (order_id, product_id, quantity, price) ");
    builder.push_values(items, |mut row, item| {
        row.push_bind(order_id).push_bind(item.product_id.clone()).push_bind(item.quantity).push_bind(item.price);
    });
    builder.build().execute(conn).await?;
    Ok(())
}

pub async fn fetch_items_for_order(
    order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, StorefrontDbError> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, quantity, price FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

pub async fn fetch_items_for_orders(
    order_ids: &[String],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, StorefrontDbError> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder =
        QueryBuilder::new("SELECT id, order_id, product_id, quantity, price FROM order_items WHERE order_id IN (");
    let mut list = builder.separated(", ");
    for id in order_ids {
        list.push_bind(id);
    }
    list.push_unseparated(")");
    builder.push(" ORDER BY id");
    let items = builder.build_query_as::<OrderItem>().fetch_all(conn).await?;
    Ok(items)
}

/// Returns the number of line items removed.
pub async fn delete_items_for_order(order_id: &str, conn: &mut SqliteConnection) -> Result<u64, StorefrontDbError> {
    let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id).execute(conn).await?;
    Ok(result.rows_affected())
}
