use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use inventory_service::HotelRoomHandler;
use payment_service::PaymentService;
use shared::*;

use super::{checkout, mirror_payment_status};
use crate::catalog::Hotel;
use crate::config::BookingConfig;
use crate::models::*;
use crate::store::OrderStore;

pub struct RoomOrderService {
    orders: Arc<dyn OrderStore<RoomOrder>>,
    hotels: Arc<HashMap<i32, Hotel>>,
    rooms: Arc<HotelRoomHandler>,
    payments: Arc<PaymentService>,
    config: BookingConfig,
}

impl RoomOrderService {
    pub fn new(
        orders: Arc<dyn OrderStore<RoomOrder>>,
        hotels: Arc<HashMap<i32, Hotel>>,
        rooms: Arc<HotelRoomHandler>,
        payments: Arc<PaymentService>,
        config: BookingConfig,
    ) -> Self {
        Self { orders, hotels, rooms, payments, config }
    }

    pub fn subscribe(&self, events: &EventCenter) {
        mirror_payment_status(self.orders.clone(), events);
    }

    pub fn create_order(&self, request: &BookHotelRequest) -> Result<RoomOrder, OrderError> {
        let hotel = self.hotels.get(&request.hotel_id);
        let room = self.rooms.room(request.room_id)?;
        let (Some(hotel), Some(room)) = (hotel, room) else {
            warn!("Booking for unknown hotel {} or room {}", request.hotel_id, request.room_id);
            return Err(OrderError::InvalidArgument("hotel or room does not exist".to_string()));
        };
        if room.hotel_id != hotel.id {
            return Err(OrderError::InvalidArgument(format!(
                "room {} does not belong to hotel {}",
                room.id, hotel.id
            )));
        }
        let nights = (request.check_out - request.check_in).num_days();
        if nights < 1 {
            return Err(OrderError::InvalidArgument(
                "check-out must be after check-in".to_string(),
            ));
        }

        let order = RoomOrder {
            header: OrderHeader::new(request.user_id, room.id, 1, room.price_per_night * nights as f64),
            hotel_id: hotel.id,
            check_in: request.check_in,
            check_out: request.check_out,
        };
        let placed = checkout(
            &*self.orders,
            &self.payments,
            &*self.rooms,
            &self.config,
            order,
            Allocation::None,
        )?;
        Ok(placed.order)
    }

    pub fn order(&self, id: Uuid) -> Result<Option<RoomOrder>, OrderError> {
        Ok(self.orders.get(id)?)
    }

    pub fn orders_by_user(&self, user_id: UserId) -> Result<Vec<RoomOrder>, OrderError> {
        Ok(self.orders.select(&|o| o.header.user_id == user_id)?)
    }

    pub fn order_by_number(&self, order_number: &str) -> Result<Option<RoomOrder>, OrderError> {
        let mut found = self
            .orders
            .select(&|o| o.header.order_number.as_deref() == Some(order_number))?;
        Ok(found.pop())
    }
}
