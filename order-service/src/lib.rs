pub mod app;
pub mod catalog;
pub mod config;
pub mod handlers;
pub mod models;
pub mod settlement;
pub mod store;

pub use app::BookingApp;
pub use catalog::Catalog;
pub use config::{BookingConfig, SettlementConfig};
pub use handlers::{RoomOrderService, TrainMealOrderService, TrainSeatOrderService};
pub use models::*;
pub use settlement::{SettlementWorker, SweepReport};
pub use store::{InMemoryOrderStore, OrderStore};
