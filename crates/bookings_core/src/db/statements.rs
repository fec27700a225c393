//! Typed registry of the compiled statements behind every repository call.
//!
//! # Responsibility
//! - Name each CRUD operation once, as an enum variant, with its SQL text.
//! - Compile every statement when the connection is set up.
//!
//! # Invariants
//! - The connection's statement cache holds every `Operation` at once, so
//!   execution never recompiles a statement.
//! - Positional parameters follow the column order of the DDL.

use crate::error::{StoreError, StoreResult};
use crate::logging::EventLog;
use crate::model::EntityKind;
use rusqlite::{CachedStatement, Connection};

const STATEMENT_CACHE_HEADROOM: usize = 4;

/// CRUD verb shared by every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    Get,
    List,
    Update,
    Delete,
}

/// One variant per entity and CRUD verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateHotel,
    GetHotel,
    ListHotels,
    UpdateHotel,
    DeleteHotel,
    CreateRoom,
    GetRoom,
    ListRooms,
    UpdateRoom,
    DeleteRoom,
    CreateVisitor,
    GetVisitor,
    ListVisitors,
    UpdateVisitor,
    DeleteVisitor,
}

impl Operation {
    pub const ALL: [Self; 15] = [
        Self::CreateHotel,
        Self::GetHotel,
        Self::ListHotels,
        Self::UpdateHotel,
        Self::DeleteHotel,
        Self::CreateRoom,
        Self::GetRoom,
        Self::ListRooms,
        Self::UpdateRoom,
        Self::DeleteRoom,
        Self::CreateVisitor,
        Self::GetVisitor,
        Self::ListVisitors,
        Self::UpdateVisitor,
        Self::DeleteVisitor,
    ];

    pub fn new(entity: EntityKind, verb: Verb) -> Self {
        match (entity, verb) {
            (EntityKind::Hotel, Verb::Create) => Self::CreateHotel,
            (EntityKind::Hotel, Verb::Get) => Self::GetHotel,
            (EntityKind::Hotel, Verb::List) => Self::ListHotels,
            (EntityKind::Hotel, Verb::Update) => Self::UpdateHotel,
            (EntityKind::Hotel, Verb::Delete) => Self::DeleteHotel,
            (EntityKind::Room, Verb::Create) => Self::CreateRoom,
            (EntityKind::Room, Verb::Get) => Self::GetRoom,
            (EntityKind::Room, Verb::List) => Self::ListRooms,
            (EntityKind::Room, Verb::Update) => Self::UpdateRoom,
            (EntityKind::Room, Verb::Delete) => Self::DeleteRoom,
            (EntityKind::Visitor, Verb::Create) => Self::CreateVisitor,
            (EntityKind::Visitor, Verb::Get) => Self::GetVisitor,
            (EntityKind::Visitor, Verb::List) => Self::ListVisitors,
            (EntityKind::Visitor, Verb::Update) => Self::UpdateVisitor,
            (EntityKind::Visitor, Verb::Delete) => Self::DeleteVisitor,
        }
    }

    /// Stable operation tag, used in errors and log events.
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateHotel => "create_hotel",
            Self::GetHotel => "get_hotel",
            Self::ListHotels => "list_hotels",
            Self::UpdateHotel => "update_hotel",
            Self::DeleteHotel => "delete_hotel",
            Self::CreateRoom => "create_room",
            Self::GetRoom => "get_room",
            Self::ListRooms => "list_rooms",
            Self::UpdateRoom => "update_room",
            Self::DeleteRoom => "delete_room",
            Self::CreateVisitor => "create_visitor",
            Self::GetVisitor => "get_visitor",
            Self::ListVisitors => "list_visitors",
            Self::UpdateVisitor => "update_visitor",
            Self::DeleteVisitor => "delete_visitor",
        }
    }

    pub fn entity(self) -> EntityKind {
        match self {
            Self::CreateHotel
            | Self::GetHotel
            | Self::ListHotels
            | Self::UpdateHotel
            | Self::DeleteHotel => EntityKind::Hotel,
            Self::CreateRoom
            | Self::GetRoom
            | Self::ListRooms
            | Self::UpdateRoom
            | Self::DeleteRoom => EntityKind::Room,
            Self::CreateVisitor
            | Self::GetVisitor
            | Self::ListVisitors
            | Self::UpdateVisitor
            | Self::DeleteVisitor => EntityKind::Visitor,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::CreateHotel => {
                "INSERT INTO hotels (country, city, hotel_name, stars) VALUES (?1, ?2, ?3, ?4);"
            }
            Self::GetHotel => {
                "SELECT id, country, city, hotel_name, stars FROM hotels WHERE id = ?1;"
            }
            Self::ListHotels => "SELECT id, country, city, hotel_name, stars FROM hotels ORDER BY id;",
            Self::UpdateHotel => {
                "UPDATE hotels SET country = ?1, city = ?2, hotel_name = ?3, stars = ?4 WHERE id = ?5;"
            }
            Self::DeleteHotel => "DELETE FROM hotels WHERE id = ?1;",
            Self::CreateRoom => {
                "INSERT INTO hotel_rooms (hotel_id, rooms, meals, bar, service, busy)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);"
            }
            Self::GetRoom => {
                "SELECT id, hotel_id, rooms, meals, bar, service, busy
                 FROM hotel_rooms WHERE id = ?1;"
            }
            Self::ListRooms => {
                "SELECT id, hotel_id, rooms, meals, bar, service, busy
                 FROM hotel_rooms ORDER BY id;"
            }
            Self::UpdateRoom => {
                "UPDATE hotel_rooms
                 SET hotel_id = ?1, rooms = ?2, meals = ?3, bar = ?4, service = ?5, busy = ?6
                 WHERE id = ?7;"
            }
            Self::DeleteRoom => "DELETE FROM hotel_rooms WHERE id = ?1;",
            Self::CreateVisitor => {
                "INSERT INTO visitors (hotel_id, hotel_room_id, first_name, last_name, age)
                 VALUES (?1, ?2, ?3, ?4, ?5);"
            }
            Self::GetVisitor => {
                "SELECT id, hotel_id, hotel_room_id, first_name, last_name, age
                 FROM visitors WHERE id = ?1;"
            }
            Self::ListVisitors => {
                "SELECT id, hotel_id, hotel_room_id, first_name, last_name, age
                 FROM visitors ORDER BY id;"
            }
            Self::UpdateVisitor => {
                "UPDATE visitors
                 SET hotel_id = ?1, hotel_room_id = ?2, first_name = ?3, last_name = ?4, age = ?5
                 WHERE id = ?6;"
            }
            Self::DeleteVisitor => "DELETE FROM visitors WHERE id = ?1;",
        }
    }

    /// Fetches the statement compiled for this operation.
    pub(crate) fn statement(self, conn: &Connection) -> rusqlite::Result<CachedStatement<'_>> {
        conn.prepare_cached(self.sql())
    }
}

/// Compiles every `Operation` into the connection's statement cache.
///
/// Fails on the first statement the schema cannot support, tagged with that
/// operation's name.
pub(crate) fn register_statements(conn: &Connection, events: &EventLog) -> StoreResult<()> {
    conn.set_prepared_statement_cache_capacity(Operation::ALL.len() + STATEMENT_CACHE_HEADROOM);

    for operation in Operation::ALL {
        if let Err(source) = operation.statement(conn) {
            events.error(format_args!(
                "event=register_statements module=db.statements status=error statement={} error={}",
                operation.name(),
                source
            ));
            return Err(StoreError::ExecutionFailed {
                op: operation.name(),
                source,
            });
        }
    }

    events.debug(format_args!(
        "event=register_statements module=db.statements status=ok count={}",
        Operation::ALL.len()
    ));
    Ok(())
}
