use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared::*;

use crate::models::*;
use crate::store::PaymentStore;

/// ```text
/// IDLE -> PENDING -> COMPLETED -> FINISHED
///   |        |           \-> REFUNDED
///   \--------+-> FAILED
/// ```
pub struct PaymentService {
    store: Arc<dyn PaymentStore>,
    events: Arc<EventCenter>,
    order_numbers: Arc<OrderNumberGenerator>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn PaymentStore>, events: Arc<EventCenter>, order_numbers: Arc<OrderNumberGenerator>) -> Self {
        Self { store, events, order_numbers }
    }

    pub fn create_payment(
        &self,
        user_id: Option<UserId>,
        payment_type: PaymentType,
        amount: f64,
        related_id: Uuid,
        quantity: u32,
        good_id: GoodId,
    ) -> Result<Payment, PaymentError> {
        let user_id = user_id.ok_or(PaymentError::InvalidUser)?;
        let order_number = self.order_numbers.next(payment_type);
        let payment = Payment::new(user_id, payment_type, amount, related_id, quantity, good_id, order_number);

        self.store.insert(payment.clone())?;
        info!(
            "Created payment {} for user {} ({:?}, amount {:.2})",
            payment.order_number, user_id, payment_type, amount
        );
        Ok(payment)
    }

    pub fn complete_payment(&self, order_number: &str, data: Option<Allocation>) -> Result<bool, PaymentError> {
        self.transition(order_number, PaymentStatus::Completed, data)
    }

    pub fn fail_payment(&self, order_number: &str, data: Option<Allocation>) -> Result<bool, PaymentError> {
        self.transition(order_number, PaymentStatus::Failed, data)
    }

    pub fn refund_payment(&self, order_number: &str, data: Option<Allocation>) -> Result<bool, PaymentError> {
        self.transition(order_number, PaymentStatus::Refunded, data)
    }

    pub fn finish_payment(&self, order_number: &str, data: Option<Allocation>) -> Result<bool, PaymentError> {
        self.transition(order_number, PaymentStatus::Finished, data)
    }

    pub fn check_payment_status(&self, payment_id: Uuid) -> Result<PaymentResult, PaymentError> {
        let Some(payment) = self.store.find_by_id(payment_id)? else {
            return Ok(PaymentResult::not_found());
        };
        Ok(PaymentResult::of(
            &payment,
            payment.remaining_seconds_at(Utc::now()),
            status_message(payment.status),
        ))
    }

    /// Starts settlement of an IDLE payment in place of a gateway.
    pub fn simulate_payment_process<D, F>(
        &self,
        order_number: &str,
        timeout_seconds: u64,
        inventory_deduction: D,
        data: F,
    ) -> Result<PaymentResult, PaymentError>
    where
        D: FnOnce() -> Result<bool, StoreError>,
        F: FnOnce() -> Allocation,
    {
        let mut inventory_deduction = Some(inventory_deduction);
        let mut data = Some(data);
        let mut transitions = Vec::new();
        let mut already_started = None;

        let found = self.store.modify(order_number, &mut |payment| {
            if payment.status != PaymentStatus::Idle {
                already_started = Some(payment.clone());
                return Ok(false);
            }
            payment.status = PaymentStatus::Pending;
            payment.payment_time = Some(Utc::now());
            payment.timeout_seconds = timeout_seconds;
            transitions.push(PaymentInfo::from_transition(payment, PaymentStatus::Idle));

            let deducted = match inventory_deduction.take() {
                Some(deduct) => deduct()?,
                None => false,
            };
            if deducted {
                payment.stock_held = true;
                if let Some(data) = data.take() {
                    payment.reserved = data();
                    payment.data = payment.reserved.clone();
                }
            } else {
                payment.status = PaymentStatus::Failed;
                transitions.push(PaymentInfo::from_transition(payment, PaymentStatus::Pending));
            }
            Ok(true)
        })?;

        if found.is_none() {
            debug!("Cannot start settlement of unknown order {}", order_number);
            return Ok(PaymentResult::not_found());
        }
        if let Some(payment) = already_started {
            debug!("Order {} is already {:?}", order_number, payment.status);
            return Ok(PaymentResult::of(
                &payment,
                payment.remaining_seconds_at(Utc::now()),
                "Payment already processed",
            ));
        }

        let failed = transitions
            .last()
            .is_some_and(|info| info.new_status == PaymentStatus::Failed);
        for info in transitions {
            self.publish(info);
        }

        let result = if failed {
            warn!("Inventory deduction failed for order {}", order_number);
            PaymentResult {
                current_status: Some(PaymentStatus::Failed),
                order_number: Some(order_number.to_string()),
                remaining_time_seconds: 0,
                message: "Insufficient inventory, order creation failed".to_string(),
            }
        } else {
            info!("Settlement of order {} started, {}s to pay", order_number, timeout_seconds);
            PaymentResult {
                current_status: Some(PaymentStatus::Pending),
                order_number: Some(order_number.to_string()),
                remaining_time_seconds: timeout_seconds,
                message: "Payment processing started".to_string(),
            }
        };
        Ok(result)
    }

    pub fn payment(&self, order_number: &str) -> Result<Option<Payment>, PaymentError> {
        Ok(self.store.find_by_order_number(order_number)?)
    }

    pub fn payment_by_id(&self, payment_id: Uuid) -> Result<Option<Payment>, PaymentError> {
        Ok(self.store.find_by_id(payment_id)?)
    }

    pub fn payments_by_user(&self, user_id: UserId) -> Result<Vec<Payment>, PaymentError> {
        Ok(self.store.find_by_user(user_id)?)
    }

    pub fn pending_payments(&self) -> Result<Vec<Payment>, PaymentError> {
        Ok(self.store.find_by_status(PaymentStatus::Pending)?)
    }

    fn transition(&self, order_number: &str, target: PaymentStatus, mut data: Option<Allocation>) -> Result<bool, PaymentError> {
        let mut applied = None;
        let mut current = None;

        let found = self.store.modify(order_number, &mut |payment| {
            if !payment.status.can_transition_to(target) {
                current = Some(payment.status);
                return Ok(false);
            }
            let previous = payment.status;
            payment.status = target;
            // `reserved` is left alone, releases read it.
            if let Some(data) = data.take() {
                payment.data = data;
            }
            applied = Some(PaymentInfo::from_transition(payment, previous));
            Ok(true)
        })?;

        match (found, applied) {
            (None, _) => {
                debug!("Ignoring {:?} for unknown order {}", target, order_number);
                Ok(false)
            }
            (Some(_), Some(info)) => {
                info!("Order {}: {:?} -> {:?}", order_number, info.old_status, info.new_status);
                self.publish(info);
                Ok(true)
            }
            (Some(_), None) => {
                debug!("Order {} cannot move from {:?} to {:?}", order_number, current, target);
                Ok(false)
            }
        }
    }

    fn publish(&self, info: PaymentInfo) {
        let order_number = info.order_number.clone();
        let outcome = self.events.publish(&Event::PaymentStatusChanged(info));
        if outcome.failed > 0 {
            warn!(
                "{} of {} handlers failed on status change of order {}",
                outcome.failed,
                outcome.failed + outcome.delivered,
                order_number
            );
        }
    }
}
