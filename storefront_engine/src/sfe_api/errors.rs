use thiserror::Error;

use crate::{db_types::OrderStatusType, traits::StorefrontDbError};

/// Why a payment notification or status change was not applied.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("The notification carries no order reference (custom or invoice)")]
    MissingCorrelationId,
    #[error("Unknown payment status '{0}'. The order is left unchanged")]
    UnknownPaymentStatus(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(String),
    #[error("Order {order_id} changed status while it was being updated (expected {expected}). Nothing was written")]
    Conflict { order_id: String, expected: OrderStatusType },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StorefrontDbError> for ReconcileError {
    fn from(e: StorefrontDbError) -> Self {
        match e {
            StorefrontDbError::OrderNotFound(id) => ReconcileError::OrderNotFound(id),
            e => ReconcileError::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(String),
}

impl From<StorefrontDbError> for OrderApiError {
    fn from(e: StorefrontDbError) -> Self {
        match e {
            StorefrontDbError::OrderNotFound(id) => OrderApiError::OrderNotFound(id),
            e => OrderApiError::DatabaseError(e.to_string()),
        }
    }
}
