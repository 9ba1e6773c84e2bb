mod room;
mod train_meal;
mod train_seat;

pub use room::RoomOrderService;
pub use train_meal::TrainMealOrderService;
pub use train_seat::TrainSeatOrderService;

use std::cell::RefCell;
use std::sync::Arc;
use tracing::{debug, error, info};

use inventory_service::ReservationHandler;
use payment_service::PaymentService;
use shared::*;

use crate::config::BookingConfig;
use crate::models::{BookingOrder, OrderError};
use crate::store::OrderStore;

pub(crate) struct Checkout<O> {
    pub order: O,
    pub allocation: Allocation,
}

pub(crate) fn checkout<O: BookingOrder>(
    orders: &dyn OrderStore<O>,
    payments: &PaymentService,
    reservations: &dyn ReservationHandler,
    config: &BookingConfig,
    order: O,
    allocation: Allocation,
) -> Result<Checkout<O>, OrderError> {
    let header = order.header().clone();
    orders.insert(order)?;

    let payment = match payments.create_payment(
        Some(header.user_id),
        O::PAYMENT_TYPE,
        header.total_amount,
        header.id,
        header.quantity,
        header.good_id,
    ) {
        Ok(payment) => payment,
        Err(e) => {
            error!("Failed to open payment for order {}: {}", header.id, e);
            orders.remove(header.id)?;
            return Err(e.into());
        }
    };

    orders.update(header.id, &mut |o| {
        let h = o.header_mut();
        h.related_payment_id = Some(payment.id);
        h.order_number = Some(payment.order_number.clone());
    })?;

    let allocation = RefCell::new(allocation);
    let result = payments.simulate_payment_process(
        &payment.order_number,
        config.payment_timeout_secs,
        || reservations.reserve(header.good_id, header.quantity, &mut allocation.borrow_mut()),
        || allocation.borrow().clone(),
    )?;
    info!(
        "Order {} ({}) checked out: {:?}, {}",
        header.id, payment.order_number, result.current_status, result.message
    );

    let order = orders.get(header.id)?.ok_or_else(|| StoreError::Inconsistent {
        entity: "order",
        id: header.id.to_string(),
        detail: "order vanished during checkout".to_string(),
    })?;
    Ok(Checkout {
        order,
        allocation: allocation.into_inner(),
    })
}

/// Keeps an order's status equal to its payment's.
pub(crate) fn mirror_payment_status<O: BookingOrder>(orders: Arc<dyn OrderStore<O>>, events: &EventCenter) {
    events.subscribe(EventType::PaymentStatusChanged, move |event| {
        let Event::PaymentStatusChanged(info) = event;
        if info.payment_type != O::PAYMENT_TYPE {
            return Ok(());
        }
        let found = orders.update(info.order_id, &mut |o| o.header_mut().status = info.new_status)?;
        if !found {
            debug!("No {:?} order {} to mirror {:?} onto", O::PAYMENT_TYPE, info.order_id, info.new_status);
        }
        Ok(())
    });
}
