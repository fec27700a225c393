//! Hotel repository over the `hotels` table.

use super::{fetch_all, fetch_one, insert, remove, update_and_fetch, CrudRepository};
use crate::db::{Database, Operation};
use crate::error::StoreResult;
use crate::model::{EntityKind, Hotel, HotelFields, RecordId};
use rusqlite::{params, Row};

pub struct SqliteHotelRepository<'db> {
    db: &'db Database,
}

impl<'db> SqliteHotelRepository<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }
}

impl CrudRepository for SqliteHotelRepository<'_> {
    type Record = Hotel;
    type Fields = HotelFields;

    const ENTITY: EntityKind = EntityKind::Hotel;

    fn create(&self, fields: &HotelFields) -> StoreResult<RecordId> {
        insert(
            self.db,
            Operation::CreateHotel,
            params![fields.country, fields.city, fields.name, fields.stars],
        )
    }

    fn get_by_id(&self, id: RecordId) -> StoreResult<Hotel> {
        fetch_one(self.db, Operation::GetHotel, id, parse_hotel_row)
    }

    fn get_all(&self) -> StoreResult<Vec<Hotel>> {
        fetch_all(self.db, Operation::ListHotels, parse_hotel_row)
    }

    fn update(&self, id: RecordId, fields: &HotelFields) -> StoreResult<Hotel> {
        update_and_fetch(
            self.db,
            Operation::UpdateHotel,
            Operation::GetHotel,
            id,
            params![fields.country, fields.city, fields.name, fields.stars, id],
            parse_hotel_row,
        )
    }

    /// Fails with a constraint violation while rooms still reference the hotel.
    fn delete(&self, id: RecordId) -> StoreResult<()> {
        remove(self.db, Operation::DeleteHotel, id)
    }
}

fn parse_hotel_row(row: &Row<'_>) -> rusqlite::Result<Hotel> {
    Ok(Hotel {
        id: row.get("id")?,
        country: row.get("country")?,
        city: row.get("city")?,
        name: row.get("hotel_name")?,
        stars: row.get("stars")?,
    })
}
