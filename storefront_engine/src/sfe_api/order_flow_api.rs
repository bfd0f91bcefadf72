use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderStatusType, OrderUpdate},
    events::{EventProducers, OrderPaidEvent},
    order_objects::{order_lines, OrderChanged, PaymentNotification, ReconcileOutcome},
    sfe_api::errors::ReconcileError,
    traits::{StorefrontDatabase, StorefrontDbError},
};

/// `OrderFlowApi` is the write side of the engine. It reconciles payment notifications onto stored orders and applies
/// admin status changes.
///
/// Every status change, whichever path it comes from, ends in [`OrderFlowApi::apply_update`]. That is the only place
/// an order is written and the only place an [`OrderPaidEvent`] is published.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: StorefrontDatabase
{
    /// Applies a verified payment notification to the order it refers to.
    ///
    /// The notification is rejected before touching the database if it has no correlation id, or if its payment status
    /// does not map onto an order status. Otherwise the order is looked up by id, then by order number. The reported
    /// shipping and payer fields are merged into the stored addresses (non-empty values win) and the new status is
    /// written with [`Self::apply_update`].
    pub async fn reconcile_payment(
        &self,
        notification: PaymentNotification,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let correlation_id = notification.correlation_id().ok_or(ReconcileError::MissingCorrelationId)?.to_string();
        let new_status = notification
            .new_status
            .ok_or_else(|| ReconcileError::UnknownPaymentStatus(notification.provider_status.clone()))?;
        let order = self
            .db
            .fetch_order_by_id_or_number(&correlation_id)
            .await?
            .ok_or_else(|| ReconcileError::OrderNotFound(correlation_id.clone()))?;
        trace!(
            "🔄️💰️ Payment status {} for order {} maps to {new_status} (currently {})",
            notification.provider_status,
            order.id,
            order.status
        );
        let update = OrderUpdate {
            order_id: order.id.clone(),
            expected_status: order.status,
            status: new_status,
            shipping_address: order.shipping_address.merge(&notification.shipping),
            billing_address: order.billing_address.merge(&notification.billing),
        };
        let outcome = self.apply_update(order, update).await?;
        match &outcome {
            ReconcileOutcome::Updated(change) => info!(
                "🔄️💰️ Order {} reconciled. Status {} -> {}",
                change.new_order.id, change.old_order.status, change.new_order.status
            ),
            ReconcileOutcome::AlreadyApplied(order) => {
                info!("🔄️💰️ Order {} already reflects this notification. Nothing to do", order.id)
            },
        }
        Ok(outcome)
    }

    /// Changes the status of an order, leaving its addresses untouched.
    ///
    /// Setting an order to the status it already has is not an error; the outcome is
    /// [`ReconcileOutcome::AlreadyApplied`] and no event is raised.
    pub async fn modify_status_for_order(
        &self,
        order_id: &str,
        new_status: OrderStatusType,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| ReconcileError::OrderNotFound(order_id.to_string()))?;
        let update = OrderUpdate {
            order_id: order.id.clone(),
            expected_status: order.status,
            status: new_status,
            shipping_address: order.shipping_address.clone(),
            billing_address: order.billing_address.clone(),
        };
        let outcome = self.apply_update(order, update).await?;
        if let ReconcileOutcome::Updated(change) = &outcome {
            info!(
                "🔄️📦️ Order {} status changed from {} to {}",
                change.new_order.id, change.old_order.status, change.new_order.status
            );
        }
        Ok(outcome)
    }

    /// Deletes the order and its line items. Returns `OrderNotFound` if there is no such order.
    pub async fn delete_order(&self, order_id: &str) -> Result<(), ReconcileError> {
        if self.db.delete_order(order_id).await? {
            info!("🔄️🗑️ Order {order_id} deleted");
            Ok(())
        } else {
            Err(ReconcileError::OrderNotFound(order_id.to_string()))
        }
    }

    /// The single transition function for orders.
    ///
    /// `old` is the snapshot the update was computed from. The write only succeeds if the stored status still equals
    /// `old.status`; otherwise [`ReconcileError::Conflict`] is returned and nothing is written. If the update would
    /// not change anything, nothing is written and [`ReconcileOutcome::AlreadyApplied`] is returned.
    ///
    /// When the order moves into `paid` from any other status, an [`OrderPaidEvent`] is published after the write.
    pub async fn apply_update(&self, old: Order, update: OrderUpdate) -> Result<ReconcileOutcome, ReconcileError> {
        if update.is_noop_for(&old) {
            debug!("🔄️ Order {} already has the requested state. No update needed", old.id);
            return Ok(ReconcileOutcome::AlreadyApplied(old));
        }
        let expected = update.expected_status;
        let order_id = update.order_id.clone();
        let new_order = match self.db.update_order(update).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!("🔄️ Order {order_id} was modified by someone else while being updated. Not overwriting it");
                return Err(ReconcileError::Conflict { order_id, expected });
            },
            Err(e) => {
                error!("🔄️ Could not update order {order_id}: {e}");
                return Err(e.into());
            },
        };
        let change = OrderChanged::new(old, new_order);
        if change.old_order.status != OrderStatusType::Paid && change.new_order.status == OrderStatusType::Paid {
            self.notify_order_paid(&change.new_order).await;
        }
        Ok(ReconcileOutcome::Updated(change))
    }

    async fn notify_order_paid(&self, order: &Order) {
        if self.producers.order_paid_producer.is_empty() {
            trace!("🔄️📦️ Order {} is paid. There are no order paid subscribers", order.id);
            return;
        }
        let event = match self.order_paid_event(order).await {
            Ok(event) => event,
            Err(e) => {
                error!(
                    "🔄️📦️ Order {} is paid, but its lines could not be loaded, so no confirmation will be sent. {e}",
                    order.id
                );
                return;
            },
        };
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📦️ Notifying order paid hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    async fn order_paid_event(&self, order: &Order) -> Result<OrderPaidEvent, StorefrontDbError> {
        let items = self.db.fetch_items_for_order(&order.id).await?;
        let mut product_ids = items.iter().map(|i| i.product_id.clone()).collect::<Vec<_>>();
        product_ids.sort();
        product_ids.dedup();
        let products = self.db.fetch_products(&product_ids).await?;
        Ok(OrderPaidEvent::new(order.clone(), order_lines(&items, &products)))
    }
}
