//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the CRUD contract shared by hotels, rooms and visitors.
//! - Isolate SQLite query details from callers.
//! - Provide the one canonical initialization sequence (`Repository::open`).
//!
//! # Invariants
//! - Every call runs a statement registered in `Operation`, under the
//!   connection deadline.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors; update and delete report zero affected rows as `NotFound`.
//! - Row-mapping failures are surfaced, never skipped.
//! - Deletes are restricted: a hotel with rooms, or a room with visitors,
//!   cannot be removed until its dependants are.

use crate::config::Config;
use crate::db::{Database, OpenOptions, Operation};
use crate::error::{StoreError, StoreResult};
use crate::logging::EventLog;
use crate::model::{EntityKind, RecordId};
use rusqlite::{Params, Row};
use std::time::Instant;

pub mod hotel_repo;
pub mod room_repo;
pub mod visitor_repo;

pub use hotel_repo::SqliteHotelRepository;
pub use room_repo::SqliteRoomRepository;
pub use visitor_repo::SqliteVisitorRepository;

/// CRUD contract implemented once per entity.
pub trait CrudRepository {
    type Record;
    type Fields;

    const ENTITY: EntityKind;

    /// Inserts a row and returns the generated id.
    fn create(&self, fields: &Self::Fields) -> StoreResult<RecordId>;

    fn get_by_id(&self, id: RecordId) -> StoreResult<Self::Record>;

    /// All rows in insertion (id) order.
    fn get_all(&self) -> StoreResult<Vec<Self::Record>>;

    /// Replaces every mutable column of row `id` and returns the row as stored.
    fn update(&self, id: RecordId, fields: &Self::Fields) -> StoreResult<Self::Record>;

    fn delete(&self, id: RecordId) -> StoreResult<()>;
}

/// Entry point owning the shared connection.
///
/// Sub-repositories borrow the same `Database`; none of them opens its own.
#[derive(Debug)]
pub struct Repository {
    db: Database,
}

impl Repository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Connect, bootstrap schema, register statements, return ready repository.
    pub fn open(config: &Config, events: EventLog) -> StoreResult<Self> {
        let descriptor = config.descriptor()?;
        let options = OpenOptions {
            reload: config.reload,
            deadline: config.statement_timeout,
        };
        Database::open(&descriptor, &options, events).map(Self::new)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn hotels(&self) -> SqliteHotelRepository<'_> {
        SqliteHotelRepository::new(&self.db)
    }

    pub fn rooms(&self) -> SqliteRoomRepository<'_> {
        SqliteRoomRepository::new(&self.db)
    }

    pub fn visitors(&self) -> SqliteVisitorRepository<'_> {
        SqliteVisitorRepository::new(&self.db)
    }
}

type RowMapper<T> = fn(&Row<'_>) -> rusqlite::Result<T>;

pub(crate) fn insert<P: Params>(db: &Database, op: Operation, params: P) -> StoreResult<RecordId> {
    run(db, op, |conn| {
        let fail = |source: rusqlite::Error| StoreError::execution(op.name(), db.deadline(), source);
        let mut stmt = op.statement(conn).map_err(fail)?;
        stmt.execute(params).map_err(fail)?;
        Ok(conn.last_insert_rowid())
    })
}

pub(crate) fn fetch_one<T>(
    db: &Database,
    op: Operation,
    id: RecordId,
    map_row: RowMapper<T>,
) -> StoreResult<T> {
    run(db, op, |conn| query_by_id(conn, db, op, id, map_row))
}

pub(crate) fn fetch_all<T>(db: &Database, op: Operation, map_row: RowMapper<T>) -> StoreResult<Vec<T>> {
    run(db, op, |conn| {
        let fail = |source: rusqlite::Error| StoreError::execution(op.name(), db.deadline(), source);
        let mut stmt = op.statement(conn).map_err(fail)?;
        let mut rows = stmt.query([]).map_err(fail)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(fail)? {
            records.push(map_row(row).map_err(fail)?);
        }
        Ok(records)
    })
}

/// Runs `update_op`, then re-reads the row with `get_op` under the same lock.
pub(crate) fn update_and_fetch<P: Params, T>(
    db: &Database,
    update_op: Operation,
    get_op: Operation,
    id: RecordId,
    params: P,
    map_row: RowMapper<T>,
) -> StoreResult<T> {
    run(db, update_op, |conn| {
        execute_by_id(conn, db, update_op, id, params)?;
        query_by_id(conn, db, get_op, id, map_row)
    })
}

pub(crate) fn remove(db: &Database, op: Operation, id: RecordId) -> StoreResult<()> {
    run(db, op, |conn| execute_by_id(conn, db, op, id, [id]))
}

fn run<T>(
    db: &Database,
    op: Operation,
    f: impl FnOnce(&rusqlite::Connection) -> StoreResult<T>,
) -> StoreResult<T> {
    let started_at = Instant::now();
    let result = db.with_connection(op.name(), |conn| f(&*conn));
    let events = db.events();
    match &result {
        Ok(_) => events.debug(format_args!(
            "event=db_exec module=repo status=ok op={} duration_ms={}",
            op.name(),
            started_at.elapsed().as_millis()
        )),
        Err(err) if err.is_not_found() => events.info(format_args!(
            "event=db_exec module=repo status=not_found op={} duration_ms={}",
            op.name(),
            started_at.elapsed().as_millis()
        )),
        Err(err) => events.error(format_args!(
            "event=db_exec module=repo status=error op={} duration_ms={} error={}",
            op.name(),
            started_at.elapsed().as_millis(),
            err
        )),
    }
    result
}

fn query_by_id<T>(
    conn: &rusqlite::Connection,
    db: &Database,
    op: Operation,
    id: RecordId,
    map_row: RowMapper<T>,
) -> StoreResult<T> {
    let fail = |source: rusqlite::Error| StoreError::execution(op.name(), db.deadline(), source);
    let mut stmt = op.statement(conn).map_err(fail)?;
    let mut rows = stmt.query([id]).map_err(fail)?;
    match rows.next().map_err(fail)? {
        Some(row) => map_row(row).map_err(fail),
        None => Err(StoreError::NotFound {
            op: op.name(),
            entity: op.entity(),
            id,
        }),
    }
}

fn execute_by_id<P: Params>(
    conn: &rusqlite::Connection,
    db: &Database,
    op: Operation,
    id: RecordId,
    params: P,
) -> StoreResult<()> {
    let fail = |source: rusqlite::Error| StoreError::execution(op.name(), db.deadline(), source);
    let mut stmt = op.statement(conn).map_err(fail)?;
    let changed = stmt.execute(params).map_err(fail)?;
    if changed == 0 {
        return Err(StoreError::NotFound {
            op: op.name(),
            entity: op.entity(),
            id,
        });
    }
    Ok(())
}
