use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use inventory_service::seat;
use inventory_service::*;
use payment_service::{InMemoryPaymentStore, PaymentService};
use shared::*;
use uuid::Uuid;

struct Stack {
    events: Arc<EventCenter>,
    payments: PaymentService,
    seats: Arc<TrainSeatHandler>,
    meals: Arc<TrainMealHandler>,
}

fn stack() -> Stack {
    let seat_store = Arc::new(InMemoryGoodsStore::new());
    seat_store
        .insert(TrainSeat::new(101, 1, SeatType::SecondClass, 80.0, 1))
        .unwrap();
    let meal_store = Arc::new(InMemoryGoodsStore::new());
    meal_store.insert(TrainMeal::new(5, 1, "Rice box", 50.0, 2)).unwrap();

    let events = Arc::new(EventCenter::new());
    let seats = Arc::new(TrainSeatHandler::new(seat_store));
    let meals = Arc::new(TrainMealHandler::new(meal_store));
    Arc::new(ReleaseOnPaymentFailure::new(seats.clone())).subscribe(&events);
    Arc::new(ReleaseOnPaymentFailure::new(meals.clone())).subscribe(&events);

    let payments = PaymentService::new(
        Arc::new(InMemoryPaymentStore::new()),
        events.clone(),
        Arc::new(OrderNumberGenerator::new()),
    );
    Stack {
        events,
        payments,
        seats,
        meals,
    }
}

/// Opens a seat payment and reserves through it, the way the ticket flow does.
fn book_seat(stack: &Stack, good_id: GoodId) -> (String, PaymentStatus) {
    let payment = stack
        .payments
        .create_payment(Some(1), PaymentType::TrainSeat, 80.0, Uuid::new_v4(), 1, good_id)
        .unwrap();
    let allocation = RefCell::new(Allocation::seat_slot());
    let result = stack
        .payments
        .simulate_payment_process(
            &payment.order_number,
            30,
            || stack.seats.reserve(good_id, 1, &mut allocation.borrow_mut()),
            || allocation.borrow().clone(),
        )
        .unwrap();
    (payment.order_number, result.current_status.unwrap())
}

#[test]
fn failed_payment_returns_the_seat() {
    let stack = stack();

    let (order_number, status) = book_seat(&stack, 101);
    assert_eq!(status, PaymentStatus::Pending);
    let payment = stack.payments.payment(&order_number).unwrap().unwrap();
    assert_eq!(payment.data.seat_label(), Some("1A"));
    let taken = stack.seats.seat(101).unwrap().unwrap();
    assert_eq!(taken.remain, 0);
    assert!(seat::is_set(&taken.seat_allocation, 0));

    let mut slot = Allocation::seat_slot();
    assert!(!stack.seats.reserve(101, 1, &mut slot).unwrap());
    assert_eq!(slot, Allocation::seat_slot());

    assert!(stack.payments.fail_payment(&order_number, None).unwrap());
    let released = stack.seats.seat(101).unwrap().unwrap();
    assert_eq!(released.remain, 1);
    assert_eq!(released.seat_allocation, vec![0]);
}

#[test]
fn failing_with_replacement_data_still_returns_the_seat() {
    let stack = stack();
    let (order_number, _) = book_seat(&stack, 101);

    assert!(stack.payments.fail_payment(&order_number, Some(Allocation::None)).unwrap());

    let payment = stack.payments.payment(&order_number).unwrap().unwrap();
    assert_eq!(payment.data, Allocation::None);
    let released = stack.seats.seat(101).unwrap().unwrap();
    assert_eq!(released.remain, 1);
    assert_eq!(released.seat_allocation, vec![0]);

    let (rebooked, status) = book_seat(&stack, 101);
    assert_eq!(status, PaymentStatus::Pending);
    let payment = stack.payments.payment(&rebooked).unwrap().unwrap();
    assert_eq!(payment.reserved.seat_label(), Some("1A"));
}

#[test]
fn refund_after_completing_with_other_data_returns_the_seat() {
    let stack = stack();
    let (order_number, _) = book_seat(&stack, 101);

    assert!(stack
        .payments
        .complete_payment(&order_number, Some(Allocation::Seat(Some("9F".to_string()))))
        .unwrap());
    assert!(stack.payments.refund_payment(&order_number, Some(Allocation::None)).unwrap());

    let released = stack.seats.seat(101).unwrap().unwrap();
    assert_eq!(released.remain, 1);
    assert_eq!(released.seat_allocation, vec![0]);
}

#[test]
fn meal_payment_example() {
    let stack = stack();
    let payment = stack
        .payments
        .create_payment(Some(1), PaymentType::TrainMeal, 100.0, Uuid::new_v4(), 2, 5)
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Idle);
    assert_eq!(payment.order_number.len(), 20);

    let result = stack
        .payments
        .simulate_payment_process(
            &payment.order_number,
            30,
            || stack.meals.reserve(5, 2, &mut Allocation::None),
            || Allocation::None,
        )
        .unwrap();
    assert_eq!(result.current_status, Some(PaymentStatus::Pending));
    assert_eq!(result.remaining_time_seconds, 30);
    assert_eq!(stack.meals.meal(5).unwrap().unwrap().remain, 0);

    let second = stack
        .payments
        .create_payment(Some(1), PaymentType::TrainMeal, 100.0, Uuid::new_v4(), 2, 5)
        .unwrap();
    let result = stack
        .payments
        .simulate_payment_process(
            &second.order_number,
            30,
            || stack.meals.reserve(5, 2, &mut Allocation::None),
            || Allocation::None,
        )
        .unwrap();
    assert_eq!(result.current_status, Some(PaymentStatus::Failed));
    assert_eq!(result.remaining_time_seconds, 0);
    assert_eq!(stack.meals.meal(5).unwrap().unwrap().remain, 0);
}

#[test]
fn failure_without_held_stock_releases_nothing() {
    let stack = stack();
    let payment = stack
        .payments
        .create_payment(Some(1), PaymentType::TrainMeal, 50.0, Uuid::new_v4(), 1, 5)
        .unwrap();

    assert!(stack.payments.fail_payment(&payment.order_number, None).unwrap());
    assert_eq!(stack.meals.meal(5).unwrap().unwrap().remain, 2);
}

#[test]
fn refund_returns_the_stock() {
    let stack = stack();
    let (order_number, _) = book_seat(&stack, 101);

    assert!(stack.payments.complete_payment(&order_number, None).unwrap());
    assert_eq!(stack.seats.seat(101).unwrap().unwrap().remain, 0);
    assert!(stack.payments.refund_payment(&order_number, None).unwrap());
    assert_eq!(stack.seats.seat(101).unwrap().unwrap().remain, 1);
}

#[test]
fn finished_payment_keeps_the_stock() {
    let stack = stack();
    let (order_number, _) = book_seat(&stack, 101);

    stack.payments.complete_payment(&order_number, None).unwrap();
    stack.payments.finish_payment(&order_number, None).unwrap();
    assert!(!stack.payments.refund_payment(&order_number, None).unwrap());
    assert_eq!(stack.seats.seat(101).unwrap().unwrap().remain, 0);
}

#[test]
fn redelivered_failure_credits_once() {
    let stack = stack();
    let payment = stack
        .payments
        .create_payment(Some(1), PaymentType::TrainMeal, 50.0, Uuid::new_v4(), 1, 5)
        .unwrap();
    stack
        .payments
        .simulate_payment_process(
            &payment.order_number,
            30,
            || stack.meals.reserve(5, 1, &mut Allocation::None),
            || Allocation::None,
        )
        .unwrap();
    stack.payments.fail_payment(&payment.order_number, None).unwrap();
    assert_eq!(stack.meals.meal(5).unwrap().unwrap().remain, 2);

    let failed = stack.payments.payment(&payment.order_number).unwrap().unwrap();
    let replay = Event::PaymentStatusChanged(PaymentInfo::from_transition(&failed, PaymentStatus::Pending));
    let outcome = stack.events.publish(&replay);

    assert_eq!(outcome.failed, 0);
    assert_eq!(stack.meals.meal(5).unwrap().unwrap().remain, 2);
}

#[test]
fn check_status_of_unknown_payment() {
    let stack = stack();
    let result = stack.payments.check_payment_status(Uuid::new_v4()).unwrap();

    assert_eq!(result.current_status, None);
    assert_eq!(result.order_number, None);
    assert_eq!(result.remaining_time_seconds, 0);
    assert_eq!(result.message, "Order not found");
}

#[test]
fn complete_on_idle_is_a_no_op() {
    let stack = stack();
    let payment = stack
        .payments
        .create_payment(Some(1), PaymentType::TrainSeat, 80.0, Uuid::new_v4(), 1, 101)
        .unwrap();

    assert!(!stack.payments.complete_payment(&payment.order_number, None).unwrap());
    assert_eq!(
        stack.payments.payment(&payment.order_number).unwrap().unwrap().status,
        PaymentStatus::Idle
    );
}

#[test]
fn reserve_release_reserve_reclaims_the_label() {
    let store = Arc::new(InMemoryGoodsStore::new());
    store.insert(TrainSeat::new(7, 1, SeatType::FirstClass, 300.0, 12)).unwrap();
    let seats = TrainSeatHandler::new(store);

    let mut first = Allocation::seat_slot();
    let mut second = Allocation::seat_slot();
    assert!(seats.reserve(7, 1, &mut first).unwrap());
    assert!(seats.reserve(7, 1, &mut second).unwrap());
    assert_eq!(second.seat_label(), Some("1B"));

    seats.release(7, 1, &second).unwrap();
    assert_eq!(seats.seat(7).unwrap().unwrap().remain, 11);

    let mut again = Allocation::seat_slot();
    assert!(seats.reserve(7, 1, &mut again).unwrap());
    assert_eq!(again, second);
    assert!(seats.seat(7).unwrap().unwrap().is_consistent());
}

#[test]
fn release_with_bad_label_changes_nothing() {
    let stack = stack();
    let mut slot = Allocation::seat_slot();
    stack.seats.reserve(101, 1, &mut slot).unwrap();

    for label in ["", "0A", "1E", "100A", "ZZ"] {
        stack.seats.release(101, 1, &Allocation::Seat(Some(label.to_string()))).unwrap();
    }
    stack.seats.release(101, 1, &Allocation::None).unwrap();

    let seat_class = stack.seats.seat(101).unwrap().unwrap();
    assert_eq!(seat_class.remain, 0);
    assert!(seat::is_set(&seat_class.seat_allocation, 0));
}

#[test]
fn concurrent_seat_reservations_never_oversell() {
    const CAPACITY: u32 = 40;
    let store = Arc::new(InMemoryGoodsStore::new());
    store.insert(TrainSeat::new(9, 1, SeatType::SecondClass, 60.0, CAPACITY)).unwrap();
    let seats = Arc::new(TrainSeatHandler::new(store));
    let threads = CAPACITY as usize + 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let (seats, barrier) = (seats.clone(), barrier.clone());
            thread::spawn(move || {
                barrier.wait();
                let mut slot = Allocation::seat_slot();
                seats
                    .reserve(9, 1, &mut slot)
                    .unwrap()
                    .then(|| slot.seat_label().map(str::to_string))
                    .flatten()
            })
        })
        .collect();
    let labels: Vec<String> = handles.into_iter().filter_map(|h| h.join().unwrap()).collect();

    assert_eq!(labels.len(), CAPACITY as usize);
    assert_eq!(labels.iter().collect::<HashSet<_>>().len(), labels.len());
    let seat_class = seats.seat(9).unwrap().unwrap();
    assert_eq!(seat_class.remain, 0);
    assert!(seat_class.is_consistent());
}

#[test]
fn concurrent_meal_payments_never_oversell() {
    const STOCK: u32 = 25;
    let store = Arc::new(InMemoryGoodsStore::new());
    store.insert(TrainMeal::new(3, 1, "Noodles", 30.0, STOCK)).unwrap();
    let meals = Arc::new(TrainMealHandler::new(store));
    let events = Arc::new(EventCenter::new());
    Arc::new(ReleaseOnPaymentFailure::new(meals.clone())).subscribe(&events);
    let payments = Arc::new(PaymentService::new(
        Arc::new(InMemoryPaymentStore::new()),
        events,
        Arc::new(OrderNumberGenerator::new()),
    ));
    let threads = STOCK as usize * 2;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let (meals, payments, barrier) = (meals.clone(), payments.clone(), barrier.clone());
            thread::spawn(move || {
                let payment = payments
                    .create_payment(Some(i as i32), PaymentType::TrainMeal, 30.0, Uuid::new_v4(), 1, 3)
                    .unwrap();
                barrier.wait();
                payments
                    .simulate_payment_process(
                        &payment.order_number,
                        30,
                        || meals.reserve(3, 1, &mut Allocation::None),
                        || Allocation::None,
                    )
                    .unwrap()
                    .current_status
            })
        })
        .collect();
    let statuses: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let pending = statuses.iter().filter(|s| **s == Some(PaymentStatus::Pending)).count();
    let failed = statuses.iter().filter(|s| **s == Some(PaymentStatus::Failed)).count();
    assert_eq!(pending, STOCK as usize);
    assert_eq!(failed, threads - STOCK as usize);
    assert_eq!(meals.meal(3).unwrap().unwrap().remain, 0);
}
