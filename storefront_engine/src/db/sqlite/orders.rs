use chrono::Utc;
use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{BillingAddress, NewOrder, Order, OrderRow, OrderUpdate},
    traits::{OrderSearchFilter, Pagination, StorefrontDbError},
};

const ORDER_COLUMNS: &str = "id, order_number, status, total, currency, discount, coupon_code, shipping_address, \
                             billing_address, created_at, updated_at";

/// Inserts a new order row using the given connection. This is not atomic. You can embed this call inside a
/// transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<(), StorefrontDbError> {
    sqlx::query(
        r#"
            INSERT INTO orders (
                id,
                order_number,
                status,
                total,
                currency,
                discount,
                coupon_code,
                shipping_address,
                billing_address,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(order.status)
    .bind(order.total)
    .bind(&order.currency)
    .bind(order.discount)
    .bind(&order.coupon_code)
    .bind(Json(&order.shipping_address))
    .bind(Json(BillingAddress::default()))
    .bind(order.created_at)
    .execute(conn)
    .await
    .map_err(|e| match StorefrontDbError::from(e) {
        StorefrontDbError::OrderAlreadyExists(_) => StorefrontDbError::OrderAlreadyExists(order.id.clone()),
        other => other,
    })?;
    debug!("🗃️ Order {} (#{}) has been saved in the DB", order.id, order.order_number);
    Ok(())
}

pub async fn fetch_order(id: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, StorefrontDbError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(row.map(Order::from))
}

pub async fn fetch_order_by_order_number(
    order_number: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StorefrontDbError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql).bind(order_number).fetch_optional(conn).await?;
    Ok(row.map(Order::from))
}

/// Writes the new status and addresses, but only if the row's status is still `update.expected_status`.
///
/// `None` means no row matched: either the order is gone, or someone else changed its status first.
pub async fn update_order(update: &OrderUpdate, conn: &mut SqliteConnection) -> Result<Option<Order>, StorefrontDbError> {
    let sql = format!(
        r#"
        UPDATE orders
        SET status = $1, shipping_address = $2, billing_address = $3, updated_at = $4
        WHERE id = $5 AND status = $6
        RETURNING {ORDER_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(update.status)
        .bind(Json(&update.shipping_address))
        .bind(Json(&update.billing_address))
        .bind(Utc::now())
        .bind(&update.order_id)
        .bind(update.expected_status)
        .fetch_optional(conn)
        .await?;
    match &row {
        Some(_) => trace!("🗃️ Order {} updated to {}", update.order_id, update.status),
        None => debug!(
            "🗃️ Order {} was not updated. It is missing or no longer has status {}",
            update.order_id, update.expected_status
        ),
    }
    Ok(row.map(Order::from))
}

/// Deletes the order row only. Line items must be removed first (see [`super::order_items::delete_items_for_order`]).
pub async fn delete_order(id: &str, conn: &mut SqliteConnection) -> Result<bool, StorefrontDbError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &OrderSearchFilter) {
    if filter.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        where_clause.push("(id LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\' OR order_number LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\' OR json_extract(shipping_address, '$.email') LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\' OR json_extract(shipping_address, '$.firstName') LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\' OR json_extract(shipping_address, '$.lastName') LIKE ");
        where_clause.push_bind_unseparated(pattern);
        where_clause.push_unseparated(" ESCAPE '\\')");
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Fetches one page of orders matching `filter`, ordered by `created_at` (newest first), and the total match count.
pub async fn search_orders(
    filter: &OrderSearchFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Order>, i64), StorefrontDbError> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filter(&mut count_query, filter);
    let total: i64 = count_query.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<OrderRow>().fetch_all(&mut *conn).await?;
    trace!("🗃️ {} orders on this page, {total} in total", rows.len());
    Ok((rows.into_iter().map(Order::from).collect(), total))
}
