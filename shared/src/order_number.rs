use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError};

use crate::PaymentType;

const SEQUENCE_SPAN: u32 = 10_000;

struct Cursor {
    second: i64,
    sequence: u32,
}

/// Issues `<tag><yyyyMMddHHmmss><nnnn>` order numbers.
pub struct OrderNumberGenerator {
    cursor: Mutex<Cursor>,
}

impl Default for OrderNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderNumberGenerator {
    pub fn new() -> Self {
        Self {
            cursor: Mutex::new(Cursor {
                second: i64::MIN,
                sequence: 0,
            }),
        }
    }

    pub fn next(&self, payment_type: PaymentType) -> String {
        self.next_at(payment_type, Utc::now())
    }

    fn next_at(&self, payment_type: PaymentType, now: DateTime<Utc>) -> String {
        let (second, sequence) = {
            let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
            let now = now.timestamp();
            if now > cursor.second {
                cursor.second = now;
                cursor.sequence = 0;
            } else if cursor.sequence + 1 >= SEQUENCE_SPAN {
                cursor.second += 1;
                cursor.sequence = 0;
            } else {
                cursor.sequence += 1;
            }
            (cursor.second, cursor.sequence)
        };

        let stamp = DateTime::from_timestamp(second, 0).unwrap_or(now);
        format!(
            "{}{}{:04}",
            payment_type.order_tag(),
            stamp.format("%Y%m%d%H%M%S"),
            sequence
        )
    }
}
