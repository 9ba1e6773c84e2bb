use serde::{Deserialize, Serialize};
use shared::{Payment, PaymentStatus, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("a payment needs a user id")]
    InvalidUser,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub current_status: Option<PaymentStatus>,
    pub order_number: Option<String>,
    pub remaining_time_seconds: u64,
    pub message: String,
}

impl PaymentResult {
    pub fn not_found() -> Self {
        Self {
            current_status: None,
            order_number: None,
            remaining_time_seconds: 0,
            message: "Order not found".to_string(),
        }
    }

    pub fn of(payment: &Payment, remaining_time_seconds: u64, message: impl Into<String>) -> Self {
        Self {
            current_status: Some(payment.status),
            order_number: Some(payment.order_number.clone()),
            remaining_time_seconds,
            message: message.into(),
        }
    }
}

pub fn status_message(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Idle => "Payment not started",
        PaymentStatus::Pending => "Payment in progress",
        PaymentStatus::Completed => "Payment completed",
        PaymentStatus::Finished => "Payment finished",
        PaymentStatus::Failed => "Payment failed",
        PaymentStatus::Refunded => "Payment refunded",
    }
}
