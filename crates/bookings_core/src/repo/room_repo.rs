//! Room repository over the `hotel_rooms` table.

use super::{fetch_all, fetch_one, insert, remove, update_and_fetch, CrudRepository};
use crate::db::{Database, Operation};
use crate::error::StoreResult;
use crate::model::{EntityKind, RecordId, Room, RoomFields};
use rusqlite::{params, Row};

pub struct SqliteRoomRepository<'db> {
    db: &'db Database,
}

impl<'db> SqliteRoomRepository<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }
}

impl CrudRepository for SqliteRoomRepository<'_> {
    type Record = Room;
    type Fields = RoomFields;

    const ENTITY: EntityKind = EntityKind::Room;

    /// Fails with a constraint violation when `hotel_id` names no hotel.
    fn create(&self, fields: &RoomFields) -> StoreResult<RecordId> {
        insert(
            self.db,
            Operation::CreateRoom,
            params![
                fields.hotel_id,
                fields.room_count,
                fields.meals,
                fields.bar,
                fields.service,
                fields.busy,
            ],
        )
    }

    fn get_by_id(&self, id: RecordId) -> StoreResult<Room> {
        fetch_one(self.db, Operation::GetRoom, id, parse_room_row)
    }

    fn get_all(&self) -> StoreResult<Vec<Room>> {
        fetch_all(self.db, Operation::ListRooms, parse_room_row)
    }

    fn update(&self, id: RecordId, fields: &RoomFields) -> StoreResult<Room> {
        update_and_fetch(
            self.db,
            Operation::UpdateRoom,
            Operation::GetRoom,
            id,
            params![
                fields.hotel_id,
                fields.room_count,
                fields.meals,
                fields.bar,
                fields.service,
                fields.busy,
                id,
            ],
            parse_room_row,
        )
    }

    fn delete(&self, id: RecordId) -> StoreResult<()> {
        remove(self.db, Operation::DeleteRoom, id)
    }
}

fn parse_room_row(row: &Row<'_>) -> rusqlite::Result<Room> {
    Ok(Room {
        id: row.get("id")?,
        hotel_id: row.get("hotel_id")?,
        room_count: row.get("rooms")?,
        meals: row.get("meals")?,
        bar: row.get("bar")?,
        service: row.get("service")?,
        busy: row.get("busy")?,
    })
}
