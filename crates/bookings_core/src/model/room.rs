//! Hotel room domain model.

use super::RecordId;
use serde::{Deserialize, Serialize};

/// A persisted `hotel_rooms` row. Belongs to exactly one hotel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RecordId,
    pub hotel_id: RecordId,
    #[serde(rename = "rooms")]
    pub room_count: i64,
    pub meals: bool,
    pub bar: bool,
    pub service: bool,
    pub busy: bool,
}

/// Mutable room columns. `hotel_id` must reference an existing hotel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomFields {
    pub hotel_id: RecordId,
    #[serde(rename = "rooms")]
    pub room_count: i64,
    #[serde(default)]
    pub meals: bool,
    #[serde(default)]
    pub bar: bool,
    #[serde(default)]
    pub service: bool,
    #[serde(default)]
    pub busy: bool,
}

impl RoomFields {
    /// Room with every amenity flag off and not occupied.
    pub fn new(hotel_id: RecordId, room_count: i64) -> Self {
        Self {
            hotel_id,
            room_count,
            meals: false,
            bar: false,
            service: false,
            busy: false,
        }
    }
}

impl Room {
    pub fn from_fields(id: RecordId, fields: &RoomFields) -> Self {
        Self {
            id,
            hotel_id: fields.hotel_id,
            room_count: fields.room_count,
            meals: fields.meals,
            bar: fields.bar,
            service: fields.service,
            busy: fields.busy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RoomFields;

    #[test]
    fn omitted_flags_default_to_false() {
        let fields: RoomFields = serde_json::from_str(r#"{"hotel_id":1,"rooms":2}"#).unwrap();
        assert_eq!(fields, RoomFields::new(1, 2));
    }
}
