use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use shared::{GoodId, StoreError};

use crate::models::Good;

/// Persistence seam for stock-bearing goods.
pub trait GoodsStore<G: Good>: Send + Sync {
    fn insert(&self, good: G) -> Result<(), StoreError>;

    fn get(&self, id: GoodId) -> Result<Option<G>, StoreError>;

    fn all(&self) -> Result<Vec<G>, StoreError>;

    fn with_locked(
        &self,
        id: GoodId,
        apply: &mut dyn FnMut(&mut G) -> Result<bool, StoreError>,
    ) -> Result<Option<bool>, StoreError>;
}

pub struct InMemoryGoodsStore<G> {
    rows: RwLock<HashMap<GoodId, Arc<Mutex<G>>>>,
}

impl<G: Good> InMemoryGoodsStore<G> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    fn row(&self, id: GoodId) -> Result<Option<Arc<Mutex<G>>>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(rows.get(&id).cloned())
    }
}

impl<G: Good> Default for InMemoryGoodsStore<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Good> GoodsStore<G> for InMemoryGoodsStore<G> {
    fn insert(&self, good: G) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("insert"))?;
        let id = good.id();
        if rows.contains_key(&id) {
            return Err(StoreError::Duplicate {
                entity: G::KIND,
                id: id.to_string(),
            });
        }
        rows.insert(id, Arc::new(Mutex::new(good)));
        Ok(())
    }

    fn get(&self, id: GoodId) -> Result<Option<G>, StoreError> {
        let Some(row) = self.row(id)? else {
            return Ok(None);
        };
        let good = row.lock().map_err(|_| StoreError::LockPoisoned("get"))?;
        Ok(Some(good.clone()))
    }

    fn all(&self) -> Result<Vec<G>, StoreError> {
        let rows: Vec<_> = {
            let rows = self
                .rows
                .read()
                .map_err(|_| StoreError::LockPoisoned("read"))?;
            rows.values().cloned().collect()
        };
        let mut goods = rows
            .iter()
            .map(|row| {
                row.lock()
                    .map(|good| good.clone())
                    .map_err(|_| StoreError::LockPoisoned("all"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        goods.sort_by_key(|good| good.id());
        Ok(goods)
    }

    fn with_locked(
        &self,
        id: GoodId,
        apply: &mut dyn FnMut(&mut G) -> Result<bool, StoreError>,
    ) -> Result<Option<bool>, StoreError> {
        let Some(row) = self.row(id)? else {
            return Ok(None);
        };
        let mut good = row
            .lock()
            .map_err(|_| StoreError::LockPoisoned("conditional update"))?;
        let mut draft = good.clone();
        let committed = apply(&mut draft)?;
        if committed {
            *good = draft;
        }
        Ok(Some(committed))
    }
}
