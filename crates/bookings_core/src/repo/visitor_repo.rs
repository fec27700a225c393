//! Visitor repository over the `visitors` table.

use super::{fetch_all, fetch_one, insert, remove, update_and_fetch, CrudRepository};
use crate::db::{Database, Operation};
use crate::error::StoreResult;
use crate::model::{EntityKind, RecordId, Visitor, VisitorFields};
use rusqlite::{params, Row};

pub struct SqliteVisitorRepository<'db> {
    db: &'db Database,
}

impl<'db> SqliteVisitorRepository<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }
}

impl CrudRepository for SqliteVisitorRepository<'_> {
    type Record = Visitor;
    type Fields = VisitorFields;

    const ENTITY: EntityKind = EntityKind::Visitor;

    /// Age outside 18..=100 or an unknown room is rejected by the schema.
    fn create(&self, fields: &VisitorFields) -> StoreResult<RecordId> {
        insert(
            self.db,
            Operation::CreateVisitor,
            params![
                fields.hotel_id,
                fields.room_id,
                fields.first_name,
                fields.last_name,
                fields.age,
            ],
        )
    }

    fn get_by_id(&self, id: RecordId) -> StoreResult<Visitor> {
        fetch_one(self.db, Operation::GetVisitor, id, parse_visitor_row)
    }

    fn get_all(&self) -> StoreResult<Vec<Visitor>> {
        fetch_all(self.db, Operation::ListVisitors, parse_visitor_row)
    }

    fn update(&self, id: RecordId, fields: &VisitorFields) -> StoreResult<Visitor> {
        update_and_fetch(
            self.db,
            Operation::UpdateVisitor,
            Operation::GetVisitor,
            id,
            params![
                fields.hotel_id,
                fields.room_id,
                fields.first_name,
                fields.last_name,
                fields.age,
                id,
            ],
            parse_visitor_row,
        )
    }

    fn delete(&self, id: RecordId) -> StoreResult<()> {
        remove(self.db, Operation::DeleteVisitor, id)
    }
}

fn parse_visitor_row(row: &Row<'_>) -> rusqlite::Result<Visitor> {
    Ok(Visitor {
        id: row.get("id")?,
        hotel_id: row.get("hotel_id")?,
        room_id: row.get("hotel_room_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        age: row.get("age")?,
    })
}
