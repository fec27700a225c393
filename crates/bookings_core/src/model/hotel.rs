//! Hotel domain model.

use super::RecordId;
use serde::{Deserialize, Serialize};

/// A persisted hotel row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: RecordId,
    pub country: String,
    pub city: String,
    /// Unique across hotels. Serialized as `hotel_name` to match the wire schema.
    #[serde(rename = "hotel_name")]
    pub name: String,
    /// Star rating, 1 to 5 inclusive.
    pub stars: i64,
}

/// Mutable hotel columns, used for both create and full-row update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelFields {
    pub country: String,
    pub city: String,
    #[serde(rename = "hotel_name")]
    pub name: String,
    pub stars: i64,
}

impl HotelFields {
    pub fn new(
        country: impl Into<String>,
        city: impl Into<String>,
        name: impl Into<String>,
        stars: i64,
    ) -> Self {
        Self {
            country: country.into(),
            city: city.into(),
            name: name.into(),
            stars,
        }
    }
}

impl Hotel {
    /// Builds the record a successful write of `fields` under `id` should read back as.
    pub fn from_fields(id: RecordId, fields: &HotelFields) -> Self {
        Self {
            id,
            country: fields.country.clone(),
            city: fields.city.clone(),
            name: fields.name.clone(),
            stars: fields.stars,
        }
    }
}
