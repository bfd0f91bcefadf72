use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use storefront_engine::{
    db_types::{NewOrder, NewOrderItem, Order, Product, ShippingAddress},
    SqliteDatabase,
    StorefrontDatabase,
};

pub fn random_db_path() -> String {
    format!("sqlite://{}/sfp_it_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    if let Err(e) = Sqlite::drop_database(url).await {
        debug!("Could not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Test database ready at {url}");
    db
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    let _ = Sqlite::drop_database(&url).await;
}

pub async fn seed_catalogue(db: &SqliteDatabase) {
    for (id, name, sku, price) in
        [("guitar", "Acoustic Guitar", Some("AG-100"), 25_000), ("strings", "Nylon Strings", None, 1_250)]
    {
        let product = Product { id: id.into(), name: name.into(), sku: sku.map(String::from), price: price.into() };
        db.upsert_product(product).await.expect("Error saving product");
    }
}

/// Stores `order123` (order number `240401101500123`): a pending order for a guitar and two sets of strings,
/// shipping to city "A".
pub async fn seed_order(db: &SqliteDatabase) -> Order {
    let shipping = ShippingAddress {
        email: "buyer@example.com".into(),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        city: "A".into(),
        country: "VN".into(),
        ..Default::default()
    };
    let order = NewOrder::new(vec![
        NewOrderItem::new("guitar", 1, 25_000.into()),
        NewOrderItem::new("strings", 2, 1_250.into()),
    ])
    .with_id("order123")
    .with_order_number("240401101500123")
    .with_shipping_address(shipping);
    db.insert_order(order).await.expect("Error inserting order")
}
