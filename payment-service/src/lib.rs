pub mod models;
pub mod service;
pub mod store;

pub use models::{status_message, PaymentError, PaymentResult};
pub use service::PaymentService;
pub use store::{InMemoryPaymentStore, PaymentStore};
