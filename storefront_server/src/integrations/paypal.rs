//! Turns a PayPal IPN message into an order update.
//!
//! The listener acknowledges every message with `200 OK` whatever happens here, so [`process_ipn`] reports failures
//! as values for the route to log.
use log::*;
use paypal_tools::{IpnPayload, IpnVerification, PayPalConfig, PaymentStatus};
use sfp_common::Money;
use storefront_engine::{
    db_types::{BillingAddress, OrderStatusType, ShippingAddress},
    traits::StorefrontDatabase,
    OrderFlowApi,
    PaymentNotification,
    ReconcileError,
    ReconcileOutcome,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpnError {
    #[error("The IPN message could not be verified with PayPal. {0}")]
    VerificationFailed(String),
    #[error("The IPN message was sent to {0}, which is not our business account")]
    ReceiverMismatch(String),
    #[error("{0}")]
    Reconcile(#[from] ReconcileError),
}

impl IpnError {
    /// True if a verified payment may not have been recorded against its order.
    pub fn is_serious(&self) -> bool {
        matches!(
            self,
            IpnError::Reconcile(
                ReconcileError::DatabaseError(_) | ReconcileError::Conflict { .. } | ReconcileError::OrderNotFound(_)
            )
        )
    }
}

/// Maps a PayPal payment status onto an order status. Statuses we do not recognise map to `None`, and the order is
/// left alone.
pub fn order_status_for(status: &PaymentStatus) -> Option<OrderStatusType> {
    match status {
        PaymentStatus::Completed => Some(OrderStatusType::Processing),
        PaymentStatus::Pending => Some(OrderStatusType::Pending),
        PaymentStatus::Failed
        | PaymentStatus::Denied
        | PaymentStatus::Expired
        | PaymentStatus::Refunded
        | PaymentStatus::Reversed => Some(OrderStatusType::Cancelled),
        PaymentStatus::Other(_) => None,
    }
}

pub fn notification_from_payload(payload: &IpnPayload) -> PaymentNotification {
    let shipping = ShippingAddress {
        email: payload.payer_email.clone(),
        name: payload.address_name.clone(),
        first_name: payload.first_name.clone(),
        last_name: payload.last_name.clone(),
        address1: payload.address_street.clone(),
        city: payload.address_city.clone(),
        state: payload.address_state.clone(),
        zip: payload.address_zip.clone(),
        country: payload.shipping_country().to_string(),
        phone: payload.contact_phone.clone(),
        ..Default::default()
    };
    let billing = BillingAddress {
        payer_id: payload.payer_id.clone(),
        payer_email: payload.payer_email.clone(),
        first_name: payload.first_name.clone(),
        last_name: payload.last_name.clone(),
        phone: payload.contact_phone.clone(),
        txn_id: payload.txn_id.clone(),
        payment_status: payload.payment_status.clone(),
        ..Default::default()
    };
    PaymentNotification {
        correlation_id: payload.correlation_id().map(String::from),
        provider_status: payload.payment_status.clone(),
        new_status: order_status_for(&payload.payment_status()),
        shipping,
        billing,
    }
}

/// Verifies the message with PayPal, checks that it was addressed to our business account and reconciles it onto the
/// order it refers to.
///
/// `raw_body` must be the body exactly as received; PayPal rejects the echo otherwise.
pub async fn process_ipn<B, V>(
    raw_body: &[u8],
    payload: &IpnPayload,
    verifier: &V,
    config: &PayPalConfig,
    api: &OrderFlowApi<B>,
) -> Result<ReconcileOutcome, IpnError>
where
    B: StorefrontDatabase,
    V: IpnVerification,
{
    let verdict = verifier.verify(raw_body).await.map_err(|e| IpnError::VerificationFailed(e.to_string()))?;
    if !verdict.is_verified() {
        return Err(IpnError::VerificationFailed(format!("PayPal responded with {verdict}")));
    }
    trace!("🅿️ IPN message {} verified", payload.txn_id);
    if !config.is_expected_receiver(&payload.receiver_email) {
        return Err(IpnError::ReceiverMismatch(payload.receiver_email.clone()));
    }
    let notification = notification_from_payload(payload);
    let outcome = api.reconcile_payment(notification).await?;
    let order = outcome.order();
    if !gross_covers_total(payload, order.total) {
        warn!(
            "🅿️ IPN {} reports a gross of {} for order {}, but the order total is {}",
            payload.txn_id, payload.mc_gross, order.id, order.total
        );
    }
    Ok(outcome)
}

/// False only when the message carries a `mc_gross` that differs from `total`. A missing or unreadable gross is not
/// counted as a mismatch.
pub fn gross_covers_total(payload: &IpnPayload, total: Money) -> bool {
    payload.gross_amount().map_or(true, |gross| gross == total)
}
