use std::{
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
    time::Duration,
};

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use futures::FutureExt;
use serde_json::{json, Value};
use storefront_engine::{
    db_types::{NewOrder, NewOrderItem, OrderStatusType},
    events::{EventHandlers, EventHooks, EventProducers},
    traits::MAX_PAGE,
    OrderFlowApi,
    OrderManagement,
    OrdersApi,
    SqliteDatabase,
    StorefrontDatabase,
};

use super::helpers::{order_status, seed_order, send_request, test_db};
use crate::routes::{DeleteOrderRoute, OrdersRoute, UpdateOrderStatusRoute};

fn configure_orders(db: SqliteDatabase, producers: EventProducers) -> impl FnOnce(&mut ServiceConfig) {
    let flow_api = OrderFlowApi::new(db.clone(), producers);
    let orders_api = OrdersApi::new(db);
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(flow_api)).app_data(web::Data::new(orders_api)).service(
            web::scope("/api")
                .service(OrdersRoute::<SqliteDatabase>::new())
                .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
                .service(DeleteOrderRoute::<SqliteDatabase>::new()),
        );
    }
}

async fn seeded_db() -> SqliteDatabase {
    let db = test_db().await;
    seed_order(&db, "order1", "240401101500001").await;
    seed_order(&db, "order2", "240401101500002").await;
    let shipped = NewOrder::new(vec![NewOrderItem::new("strings", 3, 1_250.into())])
        .with_id("order3")
        .with_order_number("240401101500003")
        .with_status(OrderStatusType::Shipped);
    db.insert_order(shipped).await.expect("Error inserting order");
    db
}

async fn get_json(db: &SqliteDatabase, uri: &str) -> (StatusCode, Value) {
    let req = TestRequest::get().uri(uri);
    let (status, body) = send_request(req, configure_orders(db.clone(), EventProducers::default())).await;
    (status, serde_json::from_str(&body).expect("Response should be JSON"))
}

fn patch(body: Value) -> TestRequest {
    TestRequest::patch().uri("/api/orders").set_json(body)
}

#[actix_web::test]
async fn list_all_orders() {
    let db = seeded_db().await;
    let (status, page) = get_json(&db, "/api/orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 1);
    assert_eq!(page["totalPages"], 1);
    let orders = page["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 3);
    let order3 = orders.iter().find(|o| o["id"] == "order3").unwrap();
    assert_eq!(order3["status"], "shipped");
    assert_eq!(order3["orderNumber"], "240401101500003");
    assert_eq!(order3["items"][0]["productId"], "strings");
    assert_eq!(order3["items"][0]["quantity"], 3);
}

#[actix_web::test]
async fn filter_and_paginate_orders() {
    let db = seeded_db().await;
    let (_, page) = get_json(&db, "/api/orders?status=all").await;
    assert_eq!(page["total"], 3);
    let (_, page) = get_json(&db, "/api/orders?status=pending").await;
    assert_eq!(page["total"], 2);
    let (_, page) = get_json(&db, "/api/orders?status=shipped&search=order3").await;
    assert_eq!(page["total"], 1);
    let (_, page) = get_json(&db, "/api/orders?search=JANE").await;
    assert_eq!(page["total"], 2);
    let (_, page) = get_json(&db, "/api/orders?page=2&limit=2").await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["orders"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn page_far_past_the_end_is_empty() {
    let db = seeded_db().await;
    let (status, page) = get_json(&db, "/api/orders?page=9223372036854775807").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], MAX_PAGE);
    assert_eq!(page["totalPages"], 1);
    assert!(page["orders"].as_array().unwrap().is_empty());
    let (status, page) = get_json(&db, "/api/orders?page=9223372036854775807&limit=100").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["orders"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn unknown_status_filter_is_rejected() {
    let db = seeded_db().await;
    let (status, body) = get_json(&db, "/api/orders?status=lost").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("lost"));
}

#[actix_web::test]
async fn update_order_status() {
    let db = seeded_db().await;
    let req = patch(json!({"id": "order1", "status": "shipped"}));
    let (status, body) = send_request(req, configure_orders(db.clone(), EventProducers::default())).await;
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["id"], "order1");
    assert_eq!(order["status"], "shipped");
    assert_eq!(order["shippingAddress"]["city"], "A");
    assert_eq!(order_status(&db, "order1").await, OrderStatusType::Shipped);
    assert_eq!(order_status(&db, "order2").await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn update_order_status_validation() {
    let db = seeded_db().await;
    for body in [json!({"status": "shipped"}), json!({"id": "order1"}), json!({"id": "order1", "status": "lost"})] {
        let (status, _) = send_request(patch(body), configure_orders(db.clone(), EventProducers::default())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let req = patch(json!({"id": "order999", "status": "shipped"}));
    let (status, body) = send_request(req, configure_orders(db.clone(), EventProducers::default())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("order999"));
    assert_eq!(order_status(&db, "order1").await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn marking_an_order_paid_sends_one_confirmation() {
    let db = seeded_db().await;
    let sent = Arc::new(AtomicI32::new(0));
    let sent_copy = sent.clone();
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(move |ev| {
        assert_eq!(ev.order.id, "order1");
        assert_eq!(ev.lines[0].name, "Acoustic Guitar");
        sent_copy.fetch_add(1, Ordering::SeqCst);
        async {}.boxed()
    });
    let handlers = EventHandlers::new(5, hooks);
    let producers = handlers.producers();
    let _tasks = handlers.start_handlers();
    for _ in 0..2 {
        let req = patch(json!({"id": "order1", "status": "paid"}));
        let (status, body) = send_request(req, configure_orders(db.clone(), producers.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#""status":"paid""#));
    }
    for _ in 0..50 {
        if sent.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    // Give a spurious second event a chance to arrive
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sent.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn delete_order() {
    let db = seeded_db().await;
    let req = TestRequest::delete().uri("/api/orders?id=order1");
    let (status, body) = send_request(req, configure_orders(db.clone(), EventProducers::default())).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    assert!(db.fetch_order("order1").await.unwrap().is_none());
    assert!(db.fetch_items_for_order("order1").await.unwrap().is_empty());
    let (_, page) = get_json(&db, "/api/orders").await;
    assert_eq!(page["total"], 2);
}

#[actix_web::test]
async fn delete_order_errors() {
    let db = seeded_db().await;
    let req = TestRequest::delete().uri("/api/orders?id=order999");
    let (status, _) = send_request(req, configure_orders(db.clone(), EventProducers::default())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let req = TestRequest::delete().uri("/api/orders");
    let (status, _) = send_request(req, configure_orders(db.clone(), EventProducers::default())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, page) = get_json(&db, "/api/orders").await;
    assert_eq!(page["total"], 3);
}
