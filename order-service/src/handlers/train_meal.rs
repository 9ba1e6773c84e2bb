use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use inventory_service::TrainMealHandler;
use payment_service::PaymentService;
use shared::*;

use super::train_seat::holds_ticket;
use super::{checkout, mirror_payment_status, TrainSeatOrderService};
use crate::config::BookingConfig;
use crate::models::*;
use crate::store::OrderStore;

pub struct TrainMealOrderService {
    orders: Arc<dyn OrderStore<TrainMealOrder>>,
    meals: Arc<TrainMealHandler>,
    seat_orders: Arc<TrainSeatOrderService>,
    payments: Arc<PaymentService>,
    config: BookingConfig,
}

impl TrainMealOrderService {
    pub fn new(
        orders: Arc<dyn OrderStore<TrainMealOrder>>,
        meals: Arc<TrainMealHandler>,
        seat_orders: Arc<TrainSeatOrderService>,
        payments: Arc<PaymentService>,
        config: BookingConfig,
    ) -> Self {
        Self { orders, meals, seat_orders, payments, config }
    }

    pub fn subscribe(&self, events: &EventCenter) {
        mirror_payment_status(self.orders.clone(), events);
    }

    pub fn create_order(&self, request: &TrainMealOrderRequest) -> Result<TrainMealOrder, OrderError> {
        let meal = match self.meals.meal(request.meal_id)? {
            Some(meal) if meal.enabled => meal,
            _ => return Err(OrderError::Unavailable("meal not found or disabled".to_string())),
        };
        if request.quantity < 1 {
            return Err(OrderError::InvalidArgument("quantity must be at least 1".to_string()));
        }

        let ticket = self
            .seat_orders
            .order(request.seat_order_id)?
            .filter(|seat| {
                seat.header.user_id == request.user_id
                    && seat.train_id == meal.train_id
                    && holds_ticket(seat.header.status)
            });
        if ticket.is_none() {
            warn!(
                "User {} has no ticket {} on train {}",
                request.user_id, request.seat_order_id, meal.train_id
            );
            return Err(OrderError::InvalidArgument(format!(
                "no ticket on train {} for this order",
                meal.train_id
            )));
        }

        let order = TrainMealOrder {
            header: OrderHeader::new(request.user_id, meal.id, request.quantity, meal.price * request.quantity as f64),
            seat_order_id: request.seat_order_id,
            train_id: meal.train_id,
        };
        let placed = checkout(
            &*self.orders,
            &self.payments,
            &*self.meals,
            &self.config,
            order,
            Allocation::None,
        )?;
        Ok(placed.order)
    }

    pub fn order(&self, id: Uuid) -> Result<Option<TrainMealOrder>, OrderError> {
        Ok(self.orders.get(id)?)
    }

    pub fn orders_by_user(&self, user_id: UserId) -> Result<Vec<TrainMealOrder>, OrderError> {
        Ok(self.orders.select(&|o| o.header.user_id == user_id)?)
    }

    pub fn orders_by_seat_order(&self, seat_order_id: Uuid) -> Result<Vec<TrainMealOrder>, OrderError> {
        Ok(self.orders.select(&|o| o.seat_order_id == seat_order_id)?)
    }

    pub fn order_by_number(&self, order_number: &str) -> Result<Option<TrainMealOrder>, OrderError> {
        let mut found = self
            .orders
            .select(&|o| o.header.order_number.as_deref() == Some(order_number))?;
        Ok(found.pop())
    }

    pub fn exists_by_seat_order(&self, seat_order_id: Uuid) -> Result<bool, OrderError> {
        Ok(!self.orders_by_seat_order(seat_order_id)?.is_empty())
    }
}
