use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error};

use crate::PaymentInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    PaymentStatusChanged,
}

#[derive(Debug, Clone)]
pub enum Event {
    PaymentStatusChanged(PaymentInfo),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::PaymentStatusChanged(_) => EventType::PaymentStatusChanged,
        }
    }
}

pub type EventHandler = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct EventCenter {
    handlers: RwLock<HashMap<EventType, Vec<EventHandler>>>,
}

impl EventCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, event_type: EventType, handler: F)
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        // No handler code ever runs under this lock, so a poisoned guard
        // still holds a consistent map.
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.entry(event_type).or_default().push(Arc::new(handler));
    }

    pub fn subscriber_count(&self, event_type: EventType) -> usize {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.get(&event_type).map_or(0, Vec::len)
    }

    pub fn publish(&self, event: &Event) -> PublishOutcome {
        let event_type = event.event_type();
        // Snapshot so handlers may subscribe or publish without deadlocking.
        let snapshot: Vec<EventHandler> = {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            handlers.get(&event_type).cloned().unwrap_or_default()
        };

        let mut outcome = PublishOutcome::default();
        for (index, handler) in snapshot.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => outcome.delivered += 1,
                Ok(Err(e)) => {
                    outcome.failed += 1;
                    error!(?event_type, handler = index, "Event handler failed: {:#}", e);
                }
                Err(_) => {
                    outcome.failed += 1;
                    error!(?event_type, handler = index, "Event handler panicked");
                }
            }
        }

        debug!(
            ?event_type,
            delivered = outcome.delivered,
            failed = outcome.failed,
            "Event published"
        );
        outcome
    }
}
