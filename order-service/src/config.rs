use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingConfig {
    pub payment_timeout_secs: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            payment_timeout_secs: 30,
        }
    }
}

/// Drives the simulated payment gateway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettlementConfig {
    pub settle_after: Duration,
    pub success_rate: f64,
    pub sweep_interval: Duration,
}

impl SettlementConfig {
    pub fn new(settle_after: Duration, success_rate: f64, sweep_interval: Duration) -> Self {
        Self {
            settle_after,
            success_rate: if success_rate.is_nan() { 0.0 } else { success_rate.clamp(0.0, 1.0) },
            sweep_interval,
        }
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), 0.8, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_is_a_probability() {
        assert_eq!(SettlementConfig::new(Duration::ZERO, 1.7, Duration::ZERO).success_rate, 1.0);
        assert_eq!(SettlementConfig::new(Duration::ZERO, -0.2, Duration::ZERO).success_rate, 0.0);
        assert_eq!(SettlementConfig::new(Duration::ZERO, f64::NAN, Duration::ZERO).success_rate, 0.0);
    }
}
