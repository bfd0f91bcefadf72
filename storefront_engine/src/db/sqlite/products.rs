use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{db_types::Product, traits::StorefrontDbError};

pub async fn upsert_product(product: Product, conn: &mut SqliteConnection) -> Result<(), StorefrontDbError> {
    sqlx::query(
        r#"
        INSERT INTO products (id, name, sku, price) VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE SET name = excluded.name, sku = excluded.sku, price = excluded.price
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.sku)
    .bind(product.price)
    .execute(conn)
    .await?;
    trace!("🗃️ Product {} saved", product.id);
    Ok(())
}

/// Fetches all products whose id is in `ids`. Ids that are not in the catalogue are skipped.
pub async fn fetch_products(ids: &[String], conn: &mut SqliteConnection) -> Result<Vec<Product>, StorefrontDbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT id, name, sku, price FROM products WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(id);
    }
    list.push_unseparated(")");
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    trace!("🗃️ {} of {} requested products found", products.len(), ids.len());
    Ok(products)
}
