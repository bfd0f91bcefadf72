use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
    Mutex,
};

use futures_util::FutureExt;
use log::*;
use storefront_engine::{
    db_types::OrderStatusType,
    events::{EventHandlers, EventHooks, OrderPaidEvent},
    OrderFlowApi,
    PaymentNotification,
    SqliteDatabase,
};

use crate::support::prepare_env::{prepare_test_env, random_db_path, seed_catalogue, seed_order, tear_down};

mod support;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
    events: Arc<Mutex<Vec<OrderPaidEvent>>>,
}

impl HookCalled {
    pub fn called(&self, event: OrderPaidEvent) {
        let _ = self.called.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<OrderPaidEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

/// Runs `f` against an api wired to an order paid hook, and waits for all hook calls to finish.
async fn with_paid_hook<F, Fut>(f: F) -> HookCalled
where
    F: FnOnce(OrderFlowApi<SqliteDatabase>) -> Fut,
    Fut: std::future::Future<Output = SqliteDatabase>,
{
    let db = prepare_test_env(&random_db_path()).await;
    seed_catalogue(&db).await;
    seed_order(&db).await;
    let hook = HookCalled::default();
    let hook_copy = hook.clone();
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(move |ev| {
        info!("🪝️ Order paid: {}", ev.order.id);
        hook_copy.called(ev);
        async {}.boxed()
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    let tasks = handlers.start_handlers();
    let api = OrderFlowApi::new(db, producers);
    // The api owns the only producers. Once `f` is done with it, the handler drains and exits.
    let db = f(api).await;
    for task in tasks {
        task.await.expect("Event handler panicked");
    }
    tear_down(db).await;
    hook
}

#[tokio::test]
async fn marking_an_order_paid_fires_one_event_with_lines() {
    let hook = with_paid_hook(|api| async move {
        let outcome = api.modify_status_for_order("order123", OrderStatusType::Paid).await.unwrap();
        assert!(outcome.is_updated());
        api.db().clone()
    })
    .await;
    assert_eq!(hook.count(), 1);
    let event = &hook.events()[0];
    assert_eq!(event.order.status, OrderStatusType::Paid);
    assert_eq!(event.lines.len(), 2);
    let guitar = event.lines.iter().find(|l| l.product_id == "guitar").unwrap();
    assert_eq!(guitar.name, "Acoustic Guitar");
    assert_eq!(guitar.sku.as_deref(), Some("AG-100"));
    let strings = event.lines.iter().find(|l| l.product_id == "strings").unwrap();
    assert_eq!(strings.quantity, 2);
    assert_eq!(strings.sku, None);
}

#[tokio::test]
async fn paying_an_already_paid_order_fires_nothing() {
    let hook = with_paid_hook(|api| async move {
        api.modify_status_for_order("order123", OrderStatusType::Paid).await.unwrap();
        let again = api.modify_status_for_order("order123", OrderStatusType::Paid).await.unwrap();
        assert!(!again.is_updated());
        api.db().clone()
    })
    .await;
    assert_eq!(hook.count(), 1);
}

#[tokio::test]
async fn completed_payment_notification_does_not_mark_the_order_paid() {
    let hook = with_paid_hook(|api| async move {
        let notification = PaymentNotification {
            correlation_id: Some("order123".into()),
            provider_status: "Completed".into(),
            new_status: Some(OrderStatusType::Processing),
            ..Default::default()
        };
        let outcome = api.reconcile_payment(notification).await.unwrap();
        // Completed payments land in `processing`, which is not `paid`, so no confirmation is sent
        assert_eq!(outcome.order().status, OrderStatusType::Processing);
        api.db().clone()
    })
    .await;
    assert_eq!(hook.count(), 0);
}

#[tokio::test]
async fn leaving_and_reentering_paid_fires_again() {
    let hook = with_paid_hook(|api| async move {
        api.modify_status_for_order("order123", OrderStatusType::Paid).await.unwrap();
        api.modify_status_for_order("order123", OrderStatusType::Cancelled).await.unwrap();
        api.modify_status_for_order("order123", OrderStatusType::Paid).await.unwrap();
        api.db().clone()
    })
    .await;
    assert_eq!(hook.count(), 2);
}
