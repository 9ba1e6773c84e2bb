use serde::{Deserialize, Serialize};
use shared::GoodId;

use crate::seat;

pub trait Good: Clone + Send + 'static {
    const KIND: &'static str;

    fn id(&self) -> GoodId;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: GoodId,
    pub hotel_id: i32,
    pub room_type: String,
    pub price_per_night: f64,
    pub capacity: u32,
    pub remain: u32,
}

impl Room {
    pub fn new(id: GoodId, hotel_id: i32, room_type: impl Into<String>, price_per_night: f64, capacity: u32) -> Self {
        Self {
            id,
            hotel_id,
            room_type: room_type.into(),
            price_per_night,
            capacity,
            remain: capacity,
        }
    }
}

impl Good for Room {
    const KIND: &'static str = "room";

    fn id(&self) -> GoodId {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatType {
    Business,
    FirstClass,
    SecondClass,
}

/// One seat class of one train. `remain` always equals `capacity` minus the
/// number of set bits in `seat_allocation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSeat {
    pub id: GoodId,
    pub train_id: i32,
    pub seat_type: SeatType,
    pub price: f64,
    pub capacity: u32,
    pub remain: u32,
    pub seat_allocation: Vec<u8>,
}

impl TrainSeat {
    pub fn new(id: GoodId, train_id: i32, seat_type: SeatType, price: f64, capacity: u32) -> Self {
        let capacity = capacity.min(seat::MAX_SEATS as u32);
        Self {
            id,
            train_id,
            seat_type,
            price,
            capacity,
            remain: capacity,
            seat_allocation: vec![0; seat::bitmap_len(capacity as usize)],
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.capacity as usize >= seat::count_set(&self.seat_allocation)
            && self.remain as usize == self.capacity as usize - seat::count_set(&self.seat_allocation)
    }
}

impl Good for TrainSeat {
    const KIND: &'static str = "train seat";

    fn id(&self) -> GoodId {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainMeal {
    pub id: GoodId,
    pub train_id: i32,
    pub name: String,
    pub price: f64,
    pub remain: u32,
    pub enabled: bool,
}

impl TrainMeal {
    pub fn new(id: GoodId, train_id: i32, name: impl Into<String>, price: f64, stock: u32) -> Self {
        Self {
            id,
            train_id,
            name: name.into(),
            price,
            remain: stock,
            enabled: true,
        }
    }
}

impl Good for TrainMeal {
    const KIND: &'static str = "train meal";

    fn id(&self) -> GoodId {
        self.id
    }
}
