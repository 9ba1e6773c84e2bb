use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use inventory_service::*;
use payment_service::{InMemoryPaymentStore, PaymentService};
use shared::*;

use crate::catalog::Catalog;
use crate::config::{BookingConfig, SettlementConfig};
use crate::handlers::*;
use crate::settlement::SettlementWorker;
use crate::store::InMemoryOrderStore;

#[derive(Clone)]
pub struct BookingApp {
    pub events: Arc<EventCenter>,
    pub payments: Arc<PaymentService>,
    pub rooms: Arc<HotelRoomHandler>,
    pub seats: Arc<TrainSeatHandler>,
    pub meals: Arc<TrainMealHandler>,
    pub room_orders: Arc<RoomOrderService>,
    pub seat_orders: Arc<TrainSeatOrderService>,
    pub meal_orders: Arc<TrainMealOrderService>,
}

impl BookingApp {
    pub fn new(config: BookingConfig, catalog: &Catalog) -> Result<Self> {
        catalog.validate()?;

        let room_store = Arc::new(InMemoryGoodsStore::<Room>::new());
        let seat_store = Arc::new(InMemoryGoodsStore::<TrainSeat>::new());
        let meal_store = Arc::new(InMemoryGoodsStore::<TrainMeal>::new());
        catalog.seed(&*room_store, &*seat_store, &*meal_store)?;

        let events = Arc::new(EventCenter::new());
        let payments = Arc::new(PaymentService::new(
            Arc::new(InMemoryPaymentStore::new()),
            events.clone(),
            Arc::new(OrderNumberGenerator::new()),
        ));

        let rooms = Arc::new(HotelRoomHandler::new(room_store));
        let seats = Arc::new(TrainSeatHandler::new(seat_store));
        let meals = Arc::new(TrainMealHandler::new(meal_store));
        let reservation_handlers: [Arc<dyn ReservationHandler>; 3] = [rooms.clone(), seats.clone(), meals.clone()];
        for handler in reservation_handlers {
            Arc::new(ReleaseOnPaymentFailure::new(handler)).subscribe(&events);
        }

        let room_orders = Arc::new(RoomOrderService::new(
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(catalog.hotels_by_id()),
            rooms.clone(),
            payments.clone(),
            config,
        ));
        let seat_orders = Arc::new(TrainSeatOrderService::new(
            Arc::new(InMemoryOrderStore::new()),
            seats.clone(),
            payments.clone(),
            config,
        ));
        let meal_orders = Arc::new(TrainMealOrderService::new(
            Arc::new(InMemoryOrderStore::new()),
            meals.clone(),
            seat_orders.clone(),
            payments.clone(),
            config,
        ));
        room_orders.subscribe(&events);
        seat_orders.subscribe(&events);
        meal_orders.subscribe(&events);

        info!(
            "Booking app ready: {} hotels, {} rooms, {} trains, {} seat classes, {} meals",
            catalog.hotels.len(),
            catalog.rooms.len(),
            catalog.trains.len(),
            catalog.seats.len(),
            catalog.meals.len()
        );
        Ok(Self {
            events,
            payments,
            rooms,
            seats,
            meals,
            room_orders,
            seat_orders,
            meal_orders,
        })
    }

    pub fn settlement_worker(&self, config: SettlementConfig) -> SettlementWorker {
        SettlementWorker::new(self.payments.clone(), config)
    }
}
