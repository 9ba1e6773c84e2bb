use chrono::{DateTime, NaiveDate, Utc};
use inventory_service::SeatType;
use payment_service::PaymentError;
use serde::{Deserialize, Serialize};
use shared::*;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("invalid booking request: {0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub id: Uuid,
    pub user_id: UserId,
    pub good_id: GoodId,
    pub quantity: u32,
    pub total_amount: f64,
    pub status: PaymentStatus,
    pub related_payment_id: Option<Uuid>,
    pub order_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderHeader {
    pub fn new(user_id: UserId, good_id: GoodId, quantity: u32, total_amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            good_id,
            quantity,
            total_amount,
            status: PaymentStatus::Idle,
            related_payment_id: None,
            order_number: None,
            created_at: Utc::now(),
        }
    }
}

pub trait BookingOrder: Clone + Send + Sync + 'static {
    const PAYMENT_TYPE: PaymentType;

    fn header(&self) -> &OrderHeader;

    fn header_mut(&mut self) -> &mut OrderHeader;

    fn id(&self) -> Uuid {
        self.header().id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomOrder {
    #[serde(flatten)]
    pub header: OrderHeader,
    pub hotel_id: i32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl RoomOrder {
    pub fn room_id(&self) -> GoodId {
        self.header.good_id
    }
}

impl BookingOrder for RoomOrder {
    const PAYMENT_TYPE: PaymentType = PaymentType::Hotel;

    fn header(&self) -> &OrderHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut OrderHeader {
        &mut self.header
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSeatOrder {
    #[serde(flatten)]
    pub header: OrderHeader,
    pub train_id: i32,
    pub seat_type: SeatType,
    pub seat_number: Option<String>,
}

impl BookingOrder for TrainSeatOrder {
    const PAYMENT_TYPE: PaymentType = PaymentType::TrainSeat;

    fn header(&self) -> &OrderHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut OrderHeader {
        &mut self.header
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainMealOrder {
    #[serde(flatten)]
    pub header: OrderHeader,
    pub seat_order_id: Uuid,
    pub train_id: i32,
}

impl TrainMealOrder {
    pub fn meal_id(&self) -> GoodId {
        self.header.good_id
    }
}

impl BookingOrder for TrainMealOrder {
    const PAYMENT_TYPE: PaymentType = PaymentType::TrainMeal;

    fn header(&self) -> &OrderHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut OrderHeader {
        &mut self.header
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookHotelRequest {
    pub user_id: UserId,
    pub hotel_id: i32,
    pub room_id: GoodId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetTicketRequest {
    pub user_id: UserId,
    pub train_seat_id: GoodId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainMealOrderRequest {
    pub user_id: UserId,
    pub seat_order_id: Uuid,
    pub meal_id: GoodId,
    pub quantity: u32,
}
