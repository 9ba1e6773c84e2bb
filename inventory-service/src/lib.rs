pub mod handlers;
pub mod models;
pub mod seat;
pub mod store;

pub use handlers::{HotelRoomHandler, ReleaseOnPaymentFailure, ReservationHandler, TrainMealHandler, TrainSeatHandler};
pub use models::{Good, Room, SeatType, TrainMeal, TrainSeat};
pub use store::{GoodsStore, InMemoryGoodsStore};
