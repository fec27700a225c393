//! Connection bootstrap for SQLite.
//!
//! # Responsibility
//! - Open file, URI or in-memory SQLite connections from a descriptor.
//! - Configure pragmas, probe liveness, migrate and compile statements.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied and every
//!   `Operation` compiled.
//! - Setup finishes within `OpenOptions::deadline` or fails with `TimedOut`.
//! - A connection that fails any setup step is closed before the error returns.

use super::{
    arm_deadline, disarm_deadline, limit_busy_wait, migrations, statements, Database, OpenOptions,
};
use crate::config::ConnectionDescriptor;
use crate::error::{StoreError, StoreResult};
use crate::logging::EventLog;
use rusqlite::{Connection, OpenFlags};
use std::time::{Duration, Instant};

impl Database {
    /// Opens the store described by `descriptor` and runs the full setup sequence.
    ///
    /// # Side effects
    /// - Applies pending migrations; with `options.reload` drops every table first.
    /// - Emits `db_open` logging events with duration and status.
    pub fn open(
        descriptor: &ConnectionDescriptor,
        options: &OpenOptions,
        events: EventLog,
    ) -> StoreResult<Self> {
        let started_at = Instant::now();
        let mode = descriptor.mode();
        events.info(format_args!(
            "event=db_open module=db status=start mode={mode} reload={}",
            options.reload
        ));

        let mut conn = match connect(descriptor) {
            Ok(conn) => conn,
            Err(err) => {
                events.error(format_args!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                ));
                return Err(err);
            }
        };

        arm_deadline(&conn, options.deadline);
        let bootstrapped = bootstrap_connection(&mut conn, options, &events, started_at);
        disarm_deadline(&conn);

        match bootstrapped {
            Ok(version) => {
                events.info(format_args!(
                    "event=db_open module=db status=ok mode={mode} duration_ms={} schema_version={version}",
                    started_at.elapsed().as_millis()
                ));
                Ok(Self::from_parts(conn, options.deadline, events))
            }
            Err(err) => {
                events.error(format_args!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                ));
                close_quietly(conn, &events);
                Err(err)
            }
        }
    }

    /// Opens a private in-memory store with default options.
    pub fn open_in_memory(events: EventLog) -> StoreResult<Self> {
        Self::open(&ConnectionDescriptor::Memory, &OpenOptions::default(), events)
    }
}

fn connect(descriptor: &ConnectionDescriptor) -> StoreResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    let opened = match descriptor {
        ConnectionDescriptor::Memory => Connection::open_in_memory(),
        ConnectionDescriptor::File(path) => Connection::open_with_flags(path, flags),
        ConnectionDescriptor::Uri(uri) => Connection::open_with_flags(uri, flags),
    };

    opened.map_err(|source| StoreError::ConnectionFailed {
        op: "db.open",
        reason: format!("cannot open {} database", descriptor.mode()),
        source: Some(source),
    })
}

fn bootstrap_connection(
    conn: &mut Connection,
    options: &OpenOptions,
    events: &EventLog,
    started_at: Instant,
) -> StoreResult<u32> {
    let deadline = options.deadline;

    within_deadline("db.open", started_at, deadline, events, || configure(conn, deadline))?;
    within_deadline("db.probe", started_at, deadline, events, || probe(conn))?;
    let version = within_deadline("db.migrate", started_at, deadline, events, || {
        migrations::bootstrap(conn, options.reload, events)
    })?;
    within_deadline("db.register_statements", started_at, deadline, events, || {
        statements::register_statements(conn, events)
    })?;

    Ok(version)
}

fn configure(conn: &Connection, deadline: Duration) -> StoreResult<()> {
    let fail = |source: rusqlite::Error| StoreError::ConnectionFailed {
        op: "db.open",
        reason: "cannot configure connection".to_string(),
        source: Some(source),
    };
    conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(fail)?;
    limit_busy_wait(conn, deadline).map_err(fail)?;
    Ok(())
}

/// Verifies the connection reaches a readable database with FK enforcement.
///
/// Reading `sqlite_master` forces the file header to be read, so a path that
/// is not a database fails here rather than on first use.
pub(super) fn probe(conn: &Connection) -> StoreResult<()> {
    let fail = |source: rusqlite::Error| StoreError::ConnectionFailed {
        op: "db.probe",
        reason: "health probe failed".to_string(),
        source: Some(source),
    };

    let one: i64 = conn.query_row("SELECT 1;", [], |row| row.get(0)).map_err(fail)?;
    if one != 1 {
        return Err(StoreError::connection(
            "db.probe",
            format!("`SELECT 1` returned {one}"),
        ));
    }
    conn.query_row("SELECT count(*) FROM sqlite_master;", [], |row| row.get::<_, i64>(0))
        .map_err(fail)?;

    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .map_err(fail)?;
    if foreign_keys != 1 {
        return Err(StoreError::connection(
            "db.probe",
            "foreign key enforcement is not available",
        ));
    }
    Ok(())
}

fn within_deadline<T>(
    op: &'static str,
    started_at: Instant,
    deadline: Duration,
    events: &EventLog,
    step: impl FnOnce() -> StoreResult<T>,
) -> StoreResult<T> {
    let result = step();
    if started_at.elapsed() < deadline {
        return result;
    }
    if let Err(err) = &result {
        events.warn(format_args!(
            "event=db_setup module=db status=error op={op} error_code=deadline_exceeded cause={err}"
        ));
    }
    Err(StoreError::TimedOut { op, deadline })
}

fn close_quietly(conn: Connection, events: &EventLog) {
    if let Err((_, err)) = conn.close() {
        events.warn(format_args!(
            "event=db_close module=db status=error error_code=db_close_failed error={err}"
        ));
    }
}
