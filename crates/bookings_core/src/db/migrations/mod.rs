//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register reversible schema steps in strictly increasing order.
//! - Apply pending steps and revert applied ones, one transaction per step.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Every `up` is `CREATE ... IF NOT EXISTS` and every `down` is guarded
//!   with `IF EXISTS`, so re-running a step is harmless.
//! - Execution stops at the first failing step; earlier steps stay committed.

use crate::error::{StoreError, StoreResult};
use crate::logging::EventLog;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    up: &'static str,
    down: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "hotels",
        up: include_str!("0001_hotels.up.sql"),
        down: include_str!("0001_hotels.down.sql"),
    },
    Migration {
        version: 2,
        name: "hotel_rooms",
        up: include_str!("0002_hotel_rooms.up.sql"),
        down: include_str!("0002_hotel_rooms.down.sql"),
    },
    Migration {
        version: 3,
        name: "visitors",
        up: include_str!("0003_visitors.up.sql"),
        down: include_str!("0003_visitors.down.sql"),
    },
    Migration {
        version: 4,
        name: "lookup_indexes",
        up: include_str!("0004_lookup_indexes.up.sql"),
        down: include_str!("0004_lookup_indexes.down.sql"),
    },
];

/// Registered steps in ascending version order.
pub fn migrations() -> &'static [Migration] {
    MIGRATIONS
}

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the applied version from `PRAGMA user_version`.
pub fn current_version(conn: &Connection) -> StoreResult<u32> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))
        .map_err(|source| StoreError::ExecutionFailed {
            op: "db.schema_version",
            source,
        })
}

/// Brings the schema to the latest version.
///
/// With `reload`, every applied step is reverted to the empty baseline first.
/// Destroys all data in that case.
pub fn bootstrap(conn: &mut Connection, reload: bool, events: &EventLog) -> StoreResult<u32> {
    if reload {
        events.warn(format_args!(
            "event=db_reload module=db.migrations status=start target=0"
        ));
        revert_migrations(conn, 0, events)?;
    }
    apply_migrations(conn, events)
}

/// Applies all pending migrations and returns the resulting version.
pub fn apply_migrations(conn: &mut Connection, events: &EventLog) -> StoreResult<u32> {
    let current = current_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(StoreError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    if current == latest {
        events.debug(format_args!(
            "event=db_migrate module=db.migrations status=ok from={current} to={latest} applied=0"
        ));
        return Ok(current);
    }

    let mut applied = 0_u32;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        if let Err(err) = run_step(conn, "db.migrate", migration, migration.up, migration.version)
        {
            events.error(format_args!(
                "event=db_migrate module=db.migrations status=error version={} name={} error={}",
                migration.version, migration.name, err
            ));
            return Err(err);
        }
        applied += 1;
        events.info(format_args!(
            "event=db_migrate module=db.migrations status=step version={} name={}",
            migration.version, migration.name
        ));
    }

    events.info(format_args!(
        "event=db_migrate module=db.migrations status=ok from={current} to={latest} applied={applied}"
    ));
    Ok(latest)
}

/// Reverts applied migrations, newest first, until `target` is reached.
///
/// `target = 0` returns the database to the empty baseline.
pub fn revert_migrations(conn: &mut Connection, target: u32, events: &EventLog) -> StoreResult<u32> {
    let current = current_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(StoreError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    for (index, migration) in MIGRATIONS.iter().enumerate().rev() {
        if migration.version > current || migration.version <= target {
            continue;
        }
        let previous = index
            .checked_sub(1)
            .and_then(|prev| MIGRATIONS.get(prev))
            .map_or(0, |prev| prev.version);

        if let Err(err) = run_step(conn, "db.revert", migration, migration.down, previous) {
            events.error(format_args!(
                "event=db_revert module=db.migrations status=error version={} name={} error={}",
                migration.version, migration.name, err
            ));
            return Err(err);
        }
        events.info(format_args!(
            "event=db_revert module=db.migrations status=step version={} name={}",
            migration.version, migration.name
        ));
    }

    let reached = current.min(target);
    events.info(format_args!(
        "event=db_revert module=db.migrations status=ok from={current} to={reached}"
    ));
    Ok(reached)
}

fn run_step(
    conn: &mut Connection,
    op: &'static str,
    migration: &Migration,
    sql: &str,
    version_after: u32,
) -> StoreResult<()> {
    let fail = |source: rusqlite::Error| StoreError::MigrationFailed {
        op,
        version: migration.version,
        name: migration.name,
        source,
    };

    let tx = conn.transaction().map_err(fail)?;
    tx.execute_batch(sql).map_err(fail)?;
    tx.execute_batch(&format!("PRAGMA user_version = {version_after};"))
        .map_err(fail)?;
    tx.commit().map_err(fail)
}

#[cfg(test)]
mod tests {
    use super::{latest_version, migrations};
    use rusqlite::Connection;

    fn schema_snapshot(conn: &Connection) -> Vec<(String, String, Option<String>)> {
        let mut stmt = conn
            .prepare("SELECT type, name, sql FROM sqlite_master ORDER BY type, name;")
            .unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap();
        rows.collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn versions_are_strictly_increasing_from_one() {
        let mut expected = 1;
        for migration in migrations() {
            assert_eq!(migration.version, expected, "gap before `{}`", migration.name);
            expected += 1;
        }
        assert_eq!(latest_version(), expected - 1);
    }

    #[test]
    fn every_step_is_guarded() {
        for migration in migrations() {
            assert!(
                migration.up.contains("IF NOT EXISTS"),
                "`{}` up must be idempotent",
                migration.name
            );
            assert!(
                migration.down.contains("IF EXISTS"),
                "`{}` down must be guarded",
                migration.name
            );
        }
    }

    #[test]
    fn every_up_can_run_twice() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();

        for migration in migrations() {
            conn.execute_batch(migration.up).unwrap();
        }
        let once = schema_snapshot(&conn);

        for migration in migrations() {
            conn.execute_batch(migration.up)
                .unwrap_or_else(|err| panic!("`{}` up is not re-runnable: {err}", migration.name));
        }
        assert_eq!(schema_snapshot(&conn), once);
        assert!(once.iter().any(|(kind, name, _)| kind == "index" && name == "idx_visitors_hotel_id"));
    }

    #[test]
    fn every_down_can_run_twice() {
        let conn = Connection::open_in_memory().unwrap();
        for migration in migrations() {
            conn.execute_batch(migration.up).unwrap();
        }
        for _ in 0..2 {
            for migration in migrations().iter().rev() {
                conn.execute_batch(migration.down)
                    .unwrap_or_else(|err| panic!("`{}` down failed: {err}", migration.name));
            }
        }
        assert!(schema_snapshot(&conn)
            .iter()
            .all(|(_, name, _)| name == "sqlite_sequence"));
    }
}
