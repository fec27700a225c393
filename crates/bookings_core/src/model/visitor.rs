//! Visitor domain model.

use super::RecordId;
use serde::{Deserialize, Serialize};

/// A persisted visitor occupying one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: RecordId,
    pub hotel_id: RecordId,
    #[serde(rename = "hotel_room_id")]
    pub room_id: RecordId,
    pub first_name: String,
    pub last_name: String,
    /// 18 to 100 inclusive.
    pub age: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorFields {
    pub hotel_id: RecordId,
    #[serde(rename = "hotel_room_id")]
    pub room_id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
}

impl VisitorFields {
    pub fn new(
        hotel_id: RecordId,
        room_id: RecordId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: i64,
    ) -> Self {
        Self {
            hotel_id,
            room_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            age,
        }
    }
}

impl Visitor {
    pub fn from_fields(id: RecordId, fields: &VisitorFields) -> Self {
        Self {
            id,
            hotel_id: fields.hotel_id,
            room_id: fields.room_id,
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            age: fields.age,
        }
    }
}
