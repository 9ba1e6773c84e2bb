use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use inventory_service::{GoodsStore, Room, SeatType, TrainMeal, TrainSeat};
use shared::GoodId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: i32,
    pub name: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub id: i32,
    pub code: String,
    pub departure: String,
    pub arrival: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSeed {
    pub id: GoodId,
    pub hotel_id: i32,
    pub room_type: String,
    pub price_per_night: f64,
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatSeed {
    pub id: GoodId,
    pub train_id: i32,
    pub seat_type: SeatType,
    pub price: f64,
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealSeed {
    pub id: GoodId,
    pub train_id: i32,
    pub name: String,
    pub price: f64,
    pub stock: u32,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub hotels: Vec<Hotel>,
    #[serde(default)]
    pub rooms: Vec<RoomSeed>,
    #[serde(default)]
    pub trains: Vec<Train>,
    #[serde(default)]
    pub seats: Vec<SeatSeed>,
    #[serde(default)]
    pub meals: Vec<MealSeed>,
}

impl Catalog {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let catalog: Catalog = serde_json::from_str(&raw)
            .with_context(|| format!("parsing catalog {}", path.display()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn demo() -> Self {
        Self {
            hotels: vec![
                Hotel { id: 1, name: "Harbour View".into(), city: "Shanghai".into() },
                Hotel { id: 2, name: "West Lake Inn".into(), city: "Hangzhou".into() },
            ],
            rooms: vec![
                RoomSeed { id: 101, hotel_id: 1, room_type: "Standard".into(), price_per_night: 299.0, capacity: 10 },
                RoomSeed { id: 102, hotel_id: 1, room_type: "Suite".into(), price_per_night: 899.0, capacity: 2 },
                RoomSeed { id: 201, hotel_id: 2, room_type: "Twin".into(), price_per_night: 399.0, capacity: 6 },
            ],
            trains: vec![
                Train { id: 1, code: "G7001".into(), departure: "Shanghai".into(), arrival: "Hangzhou".into() },
                Train { id: 2, code: "G1234".into(), departure: "Beijing".into(), arrival: "Shanghai".into() },
            ],
            seats: vec![
                SeatSeed { id: 11, train_id: 1, seat_type: SeatType::Business, price: 219.5, capacity: 5 },
                SeatSeed { id: 12, train_id: 1, seat_type: SeatType::SecondClass, price: 73.0, capacity: 60 },
                SeatSeed { id: 21, train_id: 2, seat_type: SeatType::FirstClass, price: 933.0, capacity: 24 },
            ],
            meals: vec![
                MealSeed { id: 1, train_id: 1, name: "Rice box".into(), price: 45.0, stock: 30, enabled: true },
                MealSeed { id: 2, train_id: 2, name: "Noodle soup".into(), price: 38.0, stock: 20, enabled: true },
                MealSeed { id: 3, train_id: 2, name: "Seasonal set".into(), price: 60.0, stock: 0, enabled: false },
            ],
        }
    }

    pub fn validate(&self) -> Result<()> {
        let hotels = unique_ids("hotel", self.hotels.iter().map(|h| h.id))?;
        let trains = unique_ids("train", self.trains.iter().map(|t| t.id))?;
        unique_ids("room", self.rooms.iter().map(|r| r.id))?;
        unique_ids("train seat", self.seats.iter().map(|s| s.id))?;
        unique_ids("train meal", self.meals.iter().map(|m| m.id))?;

        if let Some(room) = self.rooms.iter().find(|r| !hotels.contains(&r.hotel_id)) {
            bail!("room {} belongs to unknown hotel {}", room.id, room.hotel_id);
        }
        if let Some(seat) = self.seats.iter().find(|s| !trains.contains(&s.train_id)) {
            bail!("train seat {} belongs to unknown train {}", seat.id, seat.train_id);
        }
        if let Some(meal) = self.meals.iter().find(|m| !trains.contains(&m.train_id)) {
            bail!("train meal {} belongs to unknown train {}", meal.id, meal.train_id);
        }
        Ok(())
    }

    pub fn hotels_by_id(&self) -> HashMap<i32, Hotel> {
        self.hotels.iter().map(|h| (h.id, h.clone())).collect()
    }

    pub fn seed(
        &self,
        rooms: &dyn GoodsStore<Room>,
        seats: &dyn GoodsStore<TrainSeat>,
        meals: &dyn GoodsStore<TrainMeal>,
    ) -> Result<()> {
        for r in &self.rooms {
            rooms.insert(Room::new(r.id, r.hotel_id, r.room_type.clone(), r.price_per_night, r.capacity))?;
        }
        for s in &self.seats {
            seats.insert(TrainSeat::new(s.id, s.train_id, s.seat_type, s.price, s.capacity))?;
        }
        for m in &self.meals {
            let mut meal = TrainMeal::new(m.id, m.train_id, m.name.clone(), m.price, m.stock);
            meal.enabled = m.enabled;
            meals.insert(meal)?;
        }
        Ok(())
    }
}

fn unique_ids(kind: &str, ids: impl Iterator<Item = i32>) -> Result<HashSet<i32>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            bail!("duplicate {} id {}", kind, id);
        }
    }
    Ok(seen)
}
