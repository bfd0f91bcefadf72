use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use paypal_tools::{IpnVerdict, PayPalApiError, PayPalConfig, PayPalMode};
use serde_json::Value;
use storefront_engine::{
    db_types::OrderStatusType,
    events::EventProducers,
    OrderFlowApi,
    OrderManagement,
    SqliteDatabase,
};

use super::{
    helpers::{order_status, seed_order, send_request, test_db},
    mocks::MockIpnVerifier,
};
use crate::routes::{ipn_diagnostics, IpnListenerRoute};

const COMPLETED_IPN: &str = "payment_status=Completed&txn_id=61E67681CH3238416&txn_type=web_accept&\
                             receiver_email=shop%40example.com&mc_gross=250.00&mc_currency=USD&custom=order123&\
                             payer_email=buyer%40example.com&payer_id=LPLWNMTBWMFAY&first_name=Jane&last_name=Doe&\
                             address_street=1+Main+St&address_city=Hanoi&address_zip=100000&\
                             address_country_code=VN&charset=windows-1252";

fn configure_ipn(db: SqliteDatabase, verifier: MockIpnVerifier) -> impl FnOnce(&mut ServiceConfig) {
    let api = OrderFlowApi::new(db, EventProducers::default());
    let config = PayPalConfig::new(PayPalMode::Sandbox, "shop@example.com");
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api)).app_data(web::Data::new(verifier)).app_data(web::Data::new(config)).service(
            web::scope("/api/paypal")
                .service(IpnListenerRoute::<SqliteDatabase, MockIpnVerifier>::new())
                .service(ipn_diagnostics),
        );
    }
}

fn verifier_says(verdict: IpnVerdict) -> MockIpnVerifier {
    let mut verifier = MockIpnVerifier::new();
    verifier.expect_verify().returning(move |_| Ok(verdict.clone()));
    verifier
}

fn ipn_request(body: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/paypal/ipn")
        .insert_header(("Content-Type", "application/x-www-form-urlencoded"))
        .set_payload(body.to_string())
}

#[actix_web::test]
async fn verified_completed_payment_moves_order_to_processing() {
    let db = test_db().await;
    seed_order(&db, "order123", "240401101500123").await;
    let mut verifier = MockIpnVerifier::new();
    verifier
        .expect_verify()
        .withf(|body| body.starts_with(b"payment_status=Completed"))
        .times(1)
        .returning(|_| Ok(IpnVerdict::Verified));
    let (status, body) = send_request(ipn_request(COMPLETED_IPN), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    let order = db.fetch_order("order123").await.unwrap().unwrap();
    // PayPal payments land in processing. Only an admin marks an order as paid.
    assert_eq!(order.status, OrderStatusType::Processing);
    assert_eq!(order.shipping_address.city, "Hanoi");
    assert_eq!(order.shipping_address.address1, "1 Main St");
    assert_eq!(order.shipping_address.country, "VN");
    assert_eq!(order.shipping_address.email, "buyer@example.com");
    assert_eq!(order.billing_address.txn_id, "61E67681CH3238416");
    assert_eq!(order.billing_address.payer_id, "LPLWNMTBWMFAY");
}

#[actix_web::test]
async fn redelivered_payment_is_acknowledged_and_leaves_the_order_alone() {
    let db = test_db().await;
    seed_order(&db, "order123", "240401101500123").await;
    let verifier = verifier_says(IpnVerdict::Verified);
    let (status, _) = send_request(ipn_request(COMPLETED_IPN), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    let first = db.fetch_order("order123").await.unwrap().unwrap();
    let verifier = verifier_says(IpnVerdict::Verified);
    let (status, body) = send_request(ipn_request(COMPLETED_IPN), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    let second = db.fetch_order("order123").await.unwrap().unwrap();
    assert_eq!(first, second);
}

#[actix_web::test]
async fn invalid_messages_are_acknowledged_but_ignored() {
    let db = test_db().await;
    seed_order(&db, "order123", "240401101500123").await;
    let verifier = verifier_says(IpnVerdict::Invalid);
    let (status, body) = send_request(ipn_request(COMPLETED_IPN), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(order_status(&db, "order123").await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn only_the_exact_verified_token_counts() {
    let db = test_db().await;
    seed_order(&db, "order123", "240401101500123").await;
    let verifier = verifier_says(IpnVerdict::from_response("VERIFIED\n"));
    let (status, _) = send_request(ipn_request(COMPLETED_IPN), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order_status(&db, "order123").await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn verification_errors_are_acknowledged() {
    let db = test_db().await;
    seed_order(&db, "order123", "240401101500123").await;
    let mut verifier = MockIpnVerifier::new();
    verifier.expect_verify().returning(|_| Err(PayPalApiError::RequestError("connection refused".into())));
    let (status, body) = send_request(ipn_request(COMPLETED_IPN), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(order_status(&db, "order123").await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn payments_to_another_account_are_ignored() {
    let db = test_db().await;
    seed_order(&db, "order123", "240401101500123").await;
    let verifier = verifier_says(IpnVerdict::Verified);
    let body = COMPLETED_IPN.replace("receiver_email=shop%40example.com", "receiver_email=someone%40example.com");
    let (status, body) = send_request(ipn_request(&body), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    let order = db.fetch_order("order123").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.shipping_address.city, "A");
}

#[actix_web::test]
async fn messages_without_an_order_reference_are_acknowledged() {
    let db = test_db().await;
    seed_order(&db, "order123", "240401101500123").await;
    let verifier = verifier_says(IpnVerdict::Verified);
    let body = COMPLETED_IPN.replace("custom=order123", "custom=");
    let (status, body) = send_request(ipn_request(&body), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(order_status(&db, "order123").await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn unknown_orders_are_acknowledged() {
    let db = test_db().await;
    seed_order(&db, "order123", "240401101500123").await;
    let verifier = verifier_says(IpnVerdict::Verified);
    let body = COMPLETED_IPN.replace("custom=order123", "custom=order999");
    let (status, body) = send_request(ipn_request(&body), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(order_status(&db, "order123").await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn invoice_is_used_when_custom_is_missing() {
    let db = test_db().await;
    seed_order(&db, "order123", "240401101500123").await;
    let verifier = verifier_says(IpnVerdict::Verified);
    let body = COMPLETED_IPN.replace("custom=order123", "invoice=240401101500123");
    let (status, _) = send_request(ipn_request(&body), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order_status(&db, "order123").await, OrderStatusType::Processing);
}

#[actix_web::test]
async fn refunds_cancel_the_order() {
    let db = test_db().await;
    seed_order(&db, "order123", "240401101500123").await;
    let verifier = verifier_says(IpnVerdict::Verified);
    let body = COMPLETED_IPN.replace("payment_status=Completed", "payment_status=Refunded");
    let (status, _) = send_request(ipn_request(&body), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order_status(&db, "order123").await, OrderStatusType::Cancelled);
}

#[actix_web::test]
async fn unrecognised_payment_statuses_change_nothing() {
    let db = test_db().await;
    seed_order(&db, "order123", "240401101500123").await;
    let verifier = verifier_says(IpnVerdict::Verified);
    let body = COMPLETED_IPN.replace("payment_status=Completed", "payment_status=Canceled_Reversal");
    let (status, _) = send_request(ipn_request(&body), configure_ipn(db.clone(), verifier)).await;
    assert_eq!(status, StatusCode::OK);
    let order = db.fetch_order("order123").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.shipping_address.city, "A");
}

#[actix_web::test]
async fn diagnostics_mask_the_business_email() {
    let db = test_db().await;
    let verifier = MockIpnVerifier::new();
    let req = TestRequest::get().uri("/api/paypal/ipn");
    let (status, body) = send_request(req, configure_ipn(db, verifier)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "PayPal IPN endpoint is active");
    assert_eq!(json["mode"], "sandbox");
    assert_eq!(json["businessEmail"], "sh***@example.com");
    assert!(json["timestamp"].is_string());
}
