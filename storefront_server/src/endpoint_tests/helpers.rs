use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;
use storefront_engine::{
    db_types::{NewOrder, NewOrderItem, Order, OrderStatusType, Product, ShippingAddress},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    OrderManagement,
    SqliteDatabase,
    StorefrontDatabase,
};

/// A migrated database holding the guitar and strings products and no orders.
pub async fn test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to test database");
    for (id, name, sku, price) in
        [("guitar", "Acoustic Guitar", Some("AG-100"), 25_000), ("strings", "Nylon Strings", None, 1_250)]
    {
        let product = Product { id: id.into(), name: name.into(), sku: sku.map(String::from), price: price.into() };
        db.upsert_product(product).await.expect("Error saving product");
    }
    db
}

/// Stores a pending order for one guitar, shipping to Jane Doe in city "A".
pub async fn seed_order(db: &SqliteDatabase, id: &str, order_number: &str) -> Order {
    let shipping = ShippingAddress {
        email: "buyer@example.com".into(),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        city: "A".into(),
        ..Default::default()
    };
    let order = NewOrder::new(vec![NewOrderItem::new("guitar", 1, 25_000.into())])
        .with_id(id)
        .with_order_number(order_number)
        .with_shipping_address(shipping);
    db.insert_order(order).await.expect("Error inserting order")
}

pub async fn order_status(db: &SqliteDatabase, id: &str) -> OrderStatusType {
    db.fetch_order(id).await.expect("Error fetching order").expect("Order should exist").status
}

pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::call_service(&service, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap_or_default()).into_owned();
    (status, body)
}
