use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use shared::StoreError;

use crate::models::BookingOrder;

pub trait OrderStore<O: BookingOrder>: Send + Sync {
    fn insert(&self, order: O) -> Result<(), StoreError>;

    fn remove(&self, id: Uuid) -> Result<Option<O>, StoreError>;

    fn get(&self, id: Uuid) -> Result<Option<O>, StoreError>;

    fn select(&self, keep: &dyn Fn(&O) -> bool) -> Result<Vec<O>, StoreError>;

    fn update(&self, id: Uuid, apply: &mut dyn FnMut(&mut O)) -> Result<bool, StoreError>;
}

pub struct InMemoryOrderStore<O> {
    orders: RwLock<HashMap<Uuid, O>>,
}

impl<O: BookingOrder> InMemoryOrderStore<O> {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
        }
    }
}

impl<O: BookingOrder> Default for InMemoryOrderStore<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: BookingOrder> OrderStore<O> for InMemoryOrderStore<O> {
    fn insert(&self, order: O) -> Result<(), StoreError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| StoreError::LockPoisoned("insert order"))?;
        let id = order.id();
        if orders.contains_key(&id) {
            return Err(StoreError::Duplicate {
                entity: "order",
                id: id.to_string(),
            });
        }
        orders.insert(id, order);
        Ok(())
    }

    fn remove(&self, id: Uuid) -> Result<Option<O>, StoreError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| StoreError::LockPoisoned("remove order"))?;
        Ok(orders.remove(&id))
    }

    fn get(&self, id: Uuid) -> Result<Option<O>, StoreError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| StoreError::LockPoisoned("read orders"))?;
        Ok(orders.get(&id).cloned())
    }

    fn select(&self, keep: &dyn Fn(&O) -> bool) -> Result<Vec<O>, StoreError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| StoreError::LockPoisoned("read orders"))?;
        let mut selected: Vec<O> = orders.values().filter(|order| keep(order)).cloned().collect();
        selected.sort_by_key(|order| order.header().created_at);
        Ok(selected)
    }

    fn update(&self, id: Uuid, apply: &mut dyn FnMut(&mut O)) -> Result<bool, StoreError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| StoreError::LockPoisoned("update order"))?;
        match orders.get_mut(&id) {
            Some(order) => {
                apply(order);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
