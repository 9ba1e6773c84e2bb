use anyhow::Result;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use shared::*;

use crate::models::*;
use crate::seat;
use crate::store::GoodsStore;

/// Stock reservation for one goods domain.
pub trait ReservationHandler: Send + Sync {
    fn payment_type(&self) -> PaymentType;

    fn reserve(&self, good_id: GoodId, quantity: u32, allocation: &mut Allocation) -> Result<bool, StoreError>;

    fn release(&self, good_id: GoodId, quantity: u32, allocation: &Allocation) -> Result<(), StoreError>;
}

pub struct HotelRoomHandler {
    rooms: Arc<dyn GoodsStore<Room>>,
}

impl HotelRoomHandler {
    pub fn new(rooms: Arc<dyn GoodsStore<Room>>) -> Self {
        Self { rooms }
    }

    pub fn room(&self, id: GoodId) -> Result<Option<Room>, StoreError> {
        self.rooms.get(id)
    }
}

impl ReservationHandler for HotelRoomHandler {
    fn payment_type(&self) -> PaymentType {
        PaymentType::Hotel
    }

    fn reserve(&self, good_id: GoodId, quantity: u32, allocation: &mut Allocation) -> Result<bool, StoreError> {
        if *allocation != Allocation::None {
            warn!("Room reservation {} called with a seat allocation slot", good_id);
            return Ok(false);
        }
        let reserved = self
            .rooms
            .with_locked(good_id, &mut |room| Ok(deduct(&mut room.remain, quantity)))?
            .unwrap_or(false);
        log_reservation("room", good_id, quantity, reserved);
        Ok(reserved)
    }

    fn release(&self, good_id: GoodId, quantity: u32, _allocation: &Allocation) -> Result<(), StoreError> {
        let found = self.rooms.with_locked(good_id, &mut |room| {
            room.remain = (room.remain + quantity).min(room.capacity);
            Ok(true)
        })?;
        log_release("room", good_id, quantity, found.is_some());
        Ok(())
    }
}

pub struct TrainMealHandler {
    meals: Arc<dyn GoodsStore<TrainMeal>>,
}

impl TrainMealHandler {
    pub fn new(meals: Arc<dyn GoodsStore<TrainMeal>>) -> Self {
        Self { meals }
    }

    pub fn meal(&self, id: GoodId) -> Result<Option<TrainMeal>, StoreError> {
        self.meals.get(id)
    }
}

impl ReservationHandler for TrainMealHandler {
    fn payment_type(&self) -> PaymentType {
        PaymentType::TrainMeal
    }

    fn reserve(&self, good_id: GoodId, quantity: u32, allocation: &mut Allocation) -> Result<bool, StoreError> {
        if *allocation != Allocation::None {
            warn!("Meal reservation {} called with a seat allocation slot", good_id);
            return Ok(false);
        }
        let reserved = self
            .meals
            .with_locked(good_id, &mut |meal| {
                Ok(meal.enabled && deduct(&mut meal.remain, quantity))
            })?
            .unwrap_or(false);
        log_reservation("meal", good_id, quantity, reserved);
        Ok(reserved)
    }

    fn release(&self, good_id: GoodId, quantity: u32, _allocation: &Allocation) -> Result<(), StoreError> {
        let found = self.meals.with_locked(good_id, &mut |meal| {
            meal.remain += quantity;
            Ok(true)
        })?;
        log_release("meal", good_id, quantity, found.is_some());
        Ok(())
    }
}

pub struct TrainSeatHandler {
    seats: Arc<dyn GoodsStore<TrainSeat>>,
}

impl TrainSeatHandler {
    pub fn new(seats: Arc<dyn GoodsStore<TrainSeat>>) -> Self {
        Self { seats }
    }

    pub fn seat(&self, id: GoodId) -> Result<Option<TrainSeat>, StoreError> {
        self.seats.get(id)
    }
}

impl ReservationHandler for TrainSeatHandler {
    fn payment_type(&self) -> PaymentType {
        PaymentType::TrainSeat
    }

    fn reserve(&self, good_id: GoodId, quantity: u32, allocation: &mut Allocation) -> Result<bool, StoreError> {
        if !matches!(allocation, Allocation::Seat(_)) {
            warn!("Seat reservation {} called without a seat allocation slot", good_id);
            return Ok(false);
        }
        if quantity != 1 {
            warn!("Seat reservation {} asked for {} seats; one per call is supported", good_id, quantity);
            return Ok(false);
        }

        let mut label = None;
        let reserved = self
            .seats
            .with_locked(good_id, &mut |seat_class| {
                if seat_class.remain < 1 {
                    return Ok(false);
                }
                let Some(idx) = seat::next_available_below(&seat_class.seat_allocation, seat_class.capacity as usize) else {
                    return Err(StoreError::Inconsistent {
                        entity: TrainSeat::KIND,
                        id: good_id.to_string(),
                        detail: format!("{} seats remain but the bitmap is full", seat_class.remain),
                    });
                };
                let Some(number) = seat::idx_to_number(idx) else {
                    return Err(StoreError::Inconsistent {
                        entity: TrainSeat::KIND,
                        id: good_id.to_string(),
                        detail: format!("seat index {} has no label", idx),
                    });
                };
                seat_class.remain -= 1;
                seat_class.seat_allocation = seat::set_bit(&seat_class.seat_allocation, idx);
                label = Some(number);
                Ok(true)
            })
            .inspect_err(|e| error!("Seat reservation failed: {}", e))?
            .unwrap_or(false);

        if reserved {
            info!("Seat {} assigned from train seat {}", label.as_deref().unwrap_or("?"), good_id);
            *allocation = Allocation::Seat(label);
        } else {
            debug!("Train seat {} has no seat left", good_id);
        }
        Ok(reserved)
    }

    fn release(&self, good_id: GoodId, _quantity: u32, allocation: &Allocation) -> Result<(), StoreError> {
        let Some(idx) = allocation.seat_label().and_then(seat::number_to_idx) else {
            debug!("Ignoring seat release for {} without a valid seat label", good_id);
            return Ok(());
        };

        let released = self.seats.with_locked(good_id, &mut |seat_class| {
            // A cleared bit means the seat was already returned.
            if idx >= seat_class.capacity as usize || !seat::is_set(&seat_class.seat_allocation, idx) {
                return Ok(false);
            }
            seat_class.seat_allocation = seat::clear_bit(&seat_class.seat_allocation, idx);
            seat_class.remain += 1;
            Ok(true)
        })?;

        match released {
            Some(true) => info!("Seat {:?} returned to train seat {}", allocation.seat_label(), good_id),
            Some(false) => debug!("Seat {:?} of train seat {} was not taken", allocation.seat_label(), good_id),
            None => debug!("Ignoring seat release for unknown train seat {}", good_id),
        }
        Ok(())
    }
}

/// Releases stock when a payment of the handler's domain fails or is refunded.
pub struct ReleaseOnPaymentFailure {
    handler: Arc<dyn ReservationHandler>,
    // One entry per released payment, kept as long as the payment rows are.
    processed: Mutex<HashSet<(String, PaymentStatus)>>,
}

impl ReleaseOnPaymentFailure {
    pub fn new(handler: Arc<dyn ReservationHandler>) -> Self {
        Self {
            handler,
            processed: Mutex::new(HashSet::new()),
        }
    }

    pub fn subscribe(self: Arc<Self>, events: &EventCenter) {
        events.subscribe(EventType::PaymentStatusChanged, move |event| {
            let Event::PaymentStatusChanged(info) = event;
            self.handle_payment_status_change(info)
        });
    }

    pub fn handle_payment_status_change(&self, info: &PaymentInfo) -> Result<()> {
        if info.payment_type != self.handler.payment_type() || !info.releases_stock() {
            return Ok(());
        }

        let first_delivery = self
            .processed
            .lock()
            .map_err(|_| anyhow::anyhow!("processed event set poisoned"))?
            .insert((info.order_number.clone(), info.new_status));
        if !first_delivery {
            info!("Stock for {} already released, skipping duplicate event", info.order_number);
            return Ok(());
        }

        self.handler.release(info.good_id, info.quantity, &info.reserved)?;
        info!(
            "Released stock for order {} ({:?} -> {:?})",
            info.order_number, info.old_status, info.new_status
        );
        Ok(())
    }
}

fn deduct(remain: &mut u32, quantity: u32) -> bool {
    if *remain < quantity {
        return false;
    }
    *remain -= quantity;
    true
}

fn log_reservation(kind: &str, good_id: GoodId, quantity: u32, reserved: bool) {
    if reserved {
        info!("Reserved {} x {} {}", quantity, kind, good_id);
    } else {
        debug!("Reservation of {} x {} {} rejected", quantity, kind, good_id);
    }
}

fn log_release(kind: &str, good_id: GoodId, quantity: u32, found: bool) {
    if found {
        info!("Released {} x {} {}", quantity, kind, good_id);
    } else {
        debug!("Ignoring release for unknown {} {}", kind, good_id);
    }
}
