use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use thiserror::Error;

mod events;
mod order_number;

pub use events::{Event, EventCenter, EventHandler, EventType, PublishOutcome};
pub use order_number::OrderNumberGenerator;

pub type GoodId = i32;
pub type UserId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Hotel,
    TrainSeat,
    TrainMeal,
}

impl PaymentType {
    pub fn order_tag(self) -> &'static str {
        match self {
            PaymentType::Hotel => "HT",
            PaymentType::TrainSeat => "TS",
            PaymentType::TrainMeal => "TM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Idle,
    Pending,
    Completed,
    Finished,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Idle, Pending)
                | (Idle, Failed)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Completed, Finished)
                | (Completed, Refunded)
        )
    }
}

/// Per-reservation detail threaded from `reserve` to the eventual `release`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Allocation {
    #[default]
    None,
    Seat(Option<String>),
}

impl Allocation {
    pub fn seat_slot() -> Self {
        Allocation::Seat(None)
    }

    pub fn seat_label(&self) -> Option<&str> {
        match self {
            Allocation::Seat(Some(label)) => Some(label.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: UserId,
    pub payment_type: PaymentType,
    pub amount: f64,
    pub quantity: u32,
    pub good_id: GoodId,
    pub related_id: Uuid,
    pub order_number: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub payment_time: Option<DateTime<Utc>>,
    pub timeout_seconds: u64,
    pub data: Allocation,
    pub reserved: Allocation,
    pub stock_held: bool,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        user_id: UserId,
        payment_type: PaymentType,
        amount: f64,
        related_id: Uuid,
        quantity: u32,
        good_id: GoodId,
        order_number: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            payment_type,
            amount,
            quantity,
            good_id,
            related_id,
            order_number,
            status: PaymentStatus::Idle,
            created_at: now,
            payment_time: None,
            timeout_seconds: 0,
            data: Allocation::None,
            reserved: Allocation::None,
            stock_held: false,
            updated_at: now,
        }
    }

    pub fn remaining_seconds_at(&self, now: DateTime<Utc>) -> u64 {
        if self.status != PaymentStatus::Pending {
            return 0;
        }
        let Some(started) = self.payment_time else {
            return 0;
        };
        let elapsed = (now - started).num_seconds().max(0) as u64;
        self.timeout_seconds.saturating_sub(elapsed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub order_number: String,
    pub payment_type: PaymentType,
    pub old_status: PaymentStatus,
    pub new_status: PaymentStatus,
    pub good_id: GoodId,
    pub quantity: u32,
    pub user_id: UserId,
    pub data: Allocation,
    pub reserved: Allocation,
    pub stock_held: bool,
}

impl PaymentInfo {
    pub fn from_transition(payment: &Payment, old_status: PaymentStatus) -> Self {
        Self {
            payment_id: payment.id,
            order_id: payment.related_id,
            order_number: payment.order_number.clone(),
            payment_type: payment.payment_type,
            old_status,
            new_status: payment.status,
            good_id: payment.good_id,
            quantity: payment.quantity,
            user_id: payment.user_id,
            data: payment.data.clone(),
            reserved: payment.reserved.clone(),
            stock_held: payment.stock_held,
        }
    }

    pub fn releases_stock(&self) -> bool {
        self.stock_held
            && matches!(
                self.new_status,
                PaymentStatus::Failed | PaymentStatus::Refunded
            )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("{entity} {id} already exists")]
    Duplicate { entity: &'static str, id: String },
    #[error("inconsistent state for {entity} {id}: {detail}")]
    Inconsistent {
        entity: &'static str,
        id: String,
        detail: String,
    },
}
