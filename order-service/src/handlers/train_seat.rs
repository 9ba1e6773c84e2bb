use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use inventory_service::TrainSeatHandler;
use payment_service::PaymentService;
use shared::*;

use super::{checkout, mirror_payment_status};
use crate::config::BookingConfig;
use crate::models::*;
use crate::store::OrderStore;

pub struct TrainSeatOrderService {
    orders: Arc<dyn OrderStore<TrainSeatOrder>>,
    seats: Arc<TrainSeatHandler>,
    payments: Arc<PaymentService>,
    config: BookingConfig,
}

impl TrainSeatOrderService {
    pub fn new(
        orders: Arc<dyn OrderStore<TrainSeatOrder>>,
        seats: Arc<TrainSeatHandler>,
        payments: Arc<PaymentService>,
        config: BookingConfig,
    ) -> Self {
        Self { orders, seats, payments, config }
    }

    pub fn subscribe(&self, events: &EventCenter) {
        mirror_payment_status(self.orders.clone(), events);
    }

    pub fn create_order(&self, request: &GetTicketRequest) -> Result<TrainSeatOrder, OrderError> {
        let Some(seat_class) = self.seats.seat(request.train_seat_id)? else {
            warn!("Ticket request for unknown train seat {}", request.train_seat_id);
            return Err(OrderError::InvalidArgument(format!(
                "train seat {} does not exist",
                request.train_seat_id
            )));
        };

        let order = TrainSeatOrder {
            header: OrderHeader::new(request.user_id, seat_class.id, 1, seat_class.price),
            train_id: seat_class.train_id,
            seat_type: seat_class.seat_type,
            seat_number: None,
        };
        let placed = checkout(
            &*self.orders,
            &self.payments,
            &*self.seats,
            &self.config,
            order,
            Allocation::seat_slot(),
        )?;

        let mut order = placed.order;
        if let Some(label) = placed.allocation.seat_label() {
            let label = label.to_string();
            self.orders
                .update(order.header.id, &mut |o| o.seat_number = Some(label.clone()))?;
            info!("Seat {} held for order {}", label, order.header.id);
            order.seat_number = Some(label);
        }
        Ok(order)
    }

    pub fn order(&self, id: Uuid) -> Result<Option<TrainSeatOrder>, OrderError> {
        Ok(self.orders.get(id)?)
    }

    pub fn orders_by_user(&self, user_id: UserId) -> Result<Vec<TrainSeatOrder>, OrderError> {
        Ok(self.orders.select(&|o| o.header.user_id == user_id)?)
    }

    pub fn order_by_number(&self, order_number: &str) -> Result<Option<TrainSeatOrder>, OrderError> {
        let mut found = self
            .orders
            .select(&|o| o.header.order_number.as_deref() == Some(order_number))?;
        Ok(found.pop())
    }

    pub fn exists_by_train_and_user(&self, train_id: i32, user_id: UserId) -> Result<bool, OrderError> {
        let held = self.orders.select(&|o| {
            o.train_id == train_id && o.header.user_id == user_id && holds_ticket(o.header.status)
        })?;
        Ok(!held.is_empty())
    }
}

pub(crate) fn holds_ticket(status: PaymentStatus) -> bool {
    matches!(
        status,
        PaymentStatus::Pending | PaymentStatus::Completed | PaymentStatus::Finished
    )
}
