use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

use shared::{Payment, PaymentStatus, StoreError, UserId};

/// Persistence seam for payments.
pub trait PaymentStore: Send + Sync {
    fn insert(&self, payment: Payment) -> Result<(), StoreError>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, StoreError>;

    fn find_by_order_number(&self, order_number: &str) -> Result<Option<Payment>, StoreError>;

    fn find_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, StoreError>;

    fn find_by_user(&self, user_id: UserId) -> Result<Vec<Payment>, StoreError>;

    fn modify(
        &self,
        order_number: &str,
        apply: &mut dyn FnMut(&mut Payment) -> Result<bool, StoreError>,
    ) -> Result<Option<bool>, StoreError>;
}

#[derive(Default)]
struct Tables {
    by_order_number: HashMap<String, Arc<Mutex<Payment>>>,
    order_number_by_id: HashMap<Uuid, String>,
}

#[derive(Default)]
pub struct InMemoryPaymentStore {
    tables: RwLock<Tables>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn row(&self, order_number: &str) -> Result<Option<Arc<Mutex<Payment>>>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(tables.by_order_number.get(order_number).cloned())
    }

    fn select(&self, keep: impl Fn(&Payment) -> bool) -> Result<Vec<Payment>, StoreError> {
        let rows: Vec<_> = {
            let tables = self
                .tables
                .read()
                .map_err(|_| StoreError::LockPoisoned("read"))?;
            tables.by_order_number.values().cloned().collect()
        };
        let mut selected = Vec::new();
        for row in rows {
            let payment = row.lock().map_err(|_| StoreError::LockPoisoned("select"))?;
            if keep(&payment) {
                selected.push(payment.clone());
            }
        }
        selected.sort_by(|a, b| a.order_number.cmp(&b.order_number));
        Ok(selected)
    }
}

impl PaymentStore for InMemoryPaymentStore {
    fn insert(&self, payment: Payment) -> Result<(), StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("insert"))?;
        if tables.by_order_number.contains_key(&payment.order_number) {
            return Err(StoreError::Duplicate {
                entity: "payment",
                id: payment.order_number,
            });
        }
        tables
            .order_number_by_id
            .insert(payment.id, payment.order_number.clone());
        tables
            .by_order_number
            .insert(payment.order_number.clone(), Arc::new(Mutex::new(payment)));
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, StoreError> {
        let order_number = {
            let tables = self
                .tables
                .read()
                .map_err(|_| StoreError::LockPoisoned("read"))?;
            tables.order_number_by_id.get(&id).cloned()
        };
        match order_number {
            Some(order_number) => self.find_by_order_number(&order_number),
            None => Ok(None),
        }
    }

    fn find_by_order_number(&self, order_number: &str) -> Result<Option<Payment>, StoreError> {
        let Some(row) = self.row(order_number)? else {
            return Ok(None);
        };
        let payment = row.lock().map_err(|_| StoreError::LockPoisoned("find"))?;
        Ok(Some(payment.clone()))
    }

    fn find_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>, StoreError> {
        self.select(|payment| payment.status == status)
    }

    fn find_by_user(&self, user_id: UserId) -> Result<Vec<Payment>, StoreError> {
        self.select(|payment| payment.user_id == user_id)
    }

    fn modify(
        &self,
        order_number: &str,
        apply: &mut dyn FnMut(&mut Payment) -> Result<bool, StoreError>,
    ) -> Result<Option<bool>, StoreError> {
        let Some(row) = self.row(order_number)? else {
            return Ok(None);
        };
        let mut payment = row.lock().map_err(|_| StoreError::LockPoisoned("modify"))?;
        let mut draft = payment.clone();
        if !apply(&mut draft)? {
            return Ok(Some(false));
        }
        draft.updated_at = Utc::now();
        *payment = draft;
        Ok(Some(true))
    }
}
