use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info};

use payment_service::PaymentService;

use crate::config::SettlementConfig;

pub struct SettlementWorker {
    payments: Arc<PaymentService>,
    config: SettlementConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub completed: usize,
    pub declined: usize,
}

impl SettlementWorker {
    pub fn new(payments: Arc<PaymentService>, config: SettlementConfig) -> Self {
        Self { payments, config }
    }

    pub async fn run(&self) {
        let period = self.config.sweep_interval.max(Duration::from_millis(10));
        let mut interval = time::interval(period);

        loop {
            interval.tick().await;

            match self.sweep() {
                Ok(report) if report != SweepReport::default() => info!(?report, "Settlement sweep"),
                Ok(_) => {}
                Err(e) => error!("Error settling payments: {:#}", e),
            }
        }
    }

    pub fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(Utc::now(), &mut rand::thread_rng())
    }

    /// Fails payments whose window has run out, then settles those that
    /// have waited `settle_after`: completed with `success_rate`, else failed.
    pub fn sweep_at<R: Rng>(&self, now: DateTime<Utc>, rng: &mut R) -> Result<SweepReport> {
        let settle_after = chrono::Duration::from_std(self.config.settle_after)?;
        let mut report = SweepReport::default();

        for payment in self.payments.pending_payments()? {
            let Some(started) = payment.payment_time else {
                continue;
            };
            if payment.remaining_seconds_at(now) == 0 {
                if self.payments.fail_payment(&payment.order_number, None)? {
                    info!("Payment {} timed out", payment.order_number);
                    report.expired += 1;
                }
                continue;
            }
            if now - started < settle_after {
                continue;
            }

            if rng.gen_bool(self.config.success_rate) {
                if self.payments.complete_payment(&payment.order_number, None)? {
                    report.completed += 1;
                }
            } else if self.payments.fail_payment(&payment.order_number, None)? {
                debug!("Gateway declined payment {}", payment.order_number);
                report.declined += 1;
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payment_service::InMemoryPaymentStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::*;
    use uuid::Uuid;

    fn payments() -> Arc<PaymentService> {
        Arc::new(PaymentService::new(
            Arc::new(InMemoryPaymentStore::new()),
            Arc::new(EventCenter::new()),
            Arc::new(OrderNumberGenerator::new()),
        ))
    }

    fn pending(payments: &PaymentService, timeout_seconds: u64) -> String {
        let payment = payments
            .create_payment(Some(1), PaymentType::Hotel, 300.0, Uuid::new_v4(), 1, 101)
            .unwrap();
        payments
            .simulate_payment_process(&payment.order_number, timeout_seconds, || Ok(true), || Allocation::None)
            .unwrap();
        payment.order_number
    }

    fn status(payments: &PaymentService, order_number: &str) -> PaymentStatus {
        payments.payment(order_number).unwrap().unwrap().status
    }

    fn worker(payments: &Arc<PaymentService>, settle_after_secs: u64, success_rate: f64) -> SettlementWorker {
        SettlementWorker::new(
            payments.clone(),
            SettlementConfig::new(
                Duration::from_secs(settle_after_secs),
                success_rate,
                Duration::from_millis(10),
            ),
        )
    }

    #[test]
    fn leaves_young_payments_alone() {
        let payments = payments();
        let order_number = pending(&payments, 30);

        let report = worker(&payments, 5, 1.0)
            .sweep_at(Utc::now(), &mut StdRng::seed_from_u64(7))
            .unwrap();

        assert_eq!(report, SweepReport::default());
        assert_eq!(status(&payments, &order_number), PaymentStatus::Pending);
    }

    #[test]
    fn completes_after_settle_delay() {
        let payments = payments();
        let order_number = pending(&payments, 30);
        let later = Utc::now() + chrono::Duration::seconds(6);

        let report = worker(&payments, 5, 1.0)
            .sweep_at(later, &mut StdRng::seed_from_u64(7))
            .unwrap();

        assert_eq!(report.completed, 1);
        assert_eq!(status(&payments, &order_number), PaymentStatus::Completed);
    }

    #[test]
    fn declines_when_gateway_says_no() {
        let payments = payments();
        let order_number = pending(&payments, 30);
        let later = Utc::now() + chrono::Duration::seconds(6);

        let report = worker(&payments, 5, 0.0)
            .sweep_at(later, &mut StdRng::seed_from_u64(7))
            .unwrap();

        assert_eq!(report.declined, 1);
        assert_eq!(status(&payments, &order_number), PaymentStatus::Failed);
    }

    #[test]
    fn expires_payments_past_their_window() {
        let payments = payments();
        let order_number = pending(&payments, 30);
        let later = Utc::now() + chrono::Duration::seconds(31);

        let report = worker(&payments, 60, 1.0)
            .sweep_at(later, &mut StdRng::seed_from_u64(7))
            .unwrap();

        assert_eq!(report.expired, 1);
        assert_eq!(status(&payments, &order_number), PaymentStatus::Failed);
    }

    #[test]
    fn ignores_settled_payments() {
        let payments = payments();
        let order_number = pending(&payments, 30);
        payments.complete_payment(&order_number, None).unwrap();
        let later = Utc::now() + chrono::Duration::seconds(31);

        let report = worker(&payments, 0, 0.0)
            .sweep_at(later, &mut StdRng::seed_from_u64(7))
            .unwrap();

        assert_eq!(report, SweepReport::default());
        assert_eq!(status(&payments, &order_number), PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn run_settles_in_the_background() {
        let payments = payments();
        let order_number = pending(&payments, 30);
        let worker = worker(&payments, 0, 1.0);

        let _ = time::timeout(Duration::from_millis(200), worker.run()).await;

        assert_eq!(status(&payments, &order_number), PaymentStatus::Completed);
    }
}
