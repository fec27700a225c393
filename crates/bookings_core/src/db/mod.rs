//! SQLite connection management and schema migration entry points.
//!
//! # Responsibility
//! - Open, verify and configure the single shared SQLite connection.
//! - Apply schema migrations and compile statements before handing it out.
//! - Bound every use of the connection by a deadline.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - Access is serialized through one mutex; a caller that cannot get the
//!   connection or finish its statement within the deadline gets `TimedOut`.

use crate::config::DEFAULT_DEADLINE;
use crate::error::{StoreError, StoreResult};
use crate::logging::EventLog;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

pub mod migrations;
mod open;
pub mod statements;

pub use statements::{Operation, Verb};

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(2);
/// VM instructions between deadline checks.
const PROGRESS_CHECK_INTERVAL: i32 = 1_000;
/// Largest busy wait SQLite accepts (milliseconds held in a C int).
const MAX_BUSY_WAIT: Duration = Duration::from_millis(i32::MAX as u64);

/// Settings for the setup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Revert every migration and re-apply. Destroys data; development only.
    pub reload: bool,
    /// Bound for the whole setup sequence and for every later call.
    pub deadline: Duration,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            reload: false,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// The live, migrated connection shared by all repositories.
pub struct Database {
    conn: Mutex<Connection>,
    deadline: Duration,
    events: EventLog,
}

impl Database {
    pub(crate) fn from_parts(conn: Connection, deadline: Duration, events: EventLog) -> Self {
        Self {
            conn: Mutex::new(conn),
            deadline,
            events,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Runs `f` with exclusive use of the connection under the deadline.
    ///
    /// Waiting for the connection, waiting on other connections' locks and
    /// executing statements share one budget. Statements still running when
    /// it runs out are interrupted.
    pub(crate) fn with_connection<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let started_at = Instant::now();
        let mut conn = self.acquire(op, started_at)?;

        let budget = self.deadline.saturating_sub(started_at.elapsed());
        arm_deadline(&conn, budget);
        let result = match limit_busy_wait(&conn, budget) {
            Ok(()) => f(&mut conn),
            Err(source) => Err(StoreError::execution(op, self.deadline, source)),
        };
        disarm_deadline(&conn);
        result
    }

    /// Re-runs the liveness probe used during setup.
    pub fn health_check(&self) -> StoreResult<()> {
        self.with_connection("db.probe", |conn| open::probe(conn))
    }

    /// Applied schema version.
    pub fn schema_version(&self) -> StoreResult<u32> {
        self.with_connection("db.schema_version", |conn| migrations::current_version(conn))
    }

    /// Reverts migrations down to `target` (0 = empty schema).
    ///
    /// Statements for tables that no longer exist fail until the schema is
    /// migrated forward again.
    pub fn revert_to(&self, target: u32) -> StoreResult<u32> {
        self.with_connection("db.revert", |conn| {
            migrations::revert_migrations(conn, target, &self.events)
        })
    }

    fn acquire(&self, op: &'static str, started_at: Instant) -> StoreResult<MutexGuard<'_, Connection>> {
        loop {
            match self.conn.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(poisoned)) => {
                    self.events.warn(format_args!(
                        "event=db_lock module=db status=recovered op={op} reason=poisoned"
                    ));
                    self.conn.clear_poison();
                    return Ok(poisoned.into_inner());
                }
                Err(TryLockError::WouldBlock) => {
                    if started_at.elapsed() >= self.deadline {
                        self.events.warn(format_args!(
                            "event=db_lock module=db status=error op={op} error_code=lock_timeout"
                        ));
                        return Err(StoreError::TimedOut {
                            op,
                            deadline: self.deadline,
                        });
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
            }
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// A budget too large to represent as an instant never expires.
fn arm_deadline(conn: &Connection, budget: Duration) {
    let expires_at = Instant::now().checked_add(budget);
    conn.progress_handler(
        PROGRESS_CHECK_INTERVAL,
        Some(move || expires_at.is_some_and(|at| Instant::now() >= at)),
    );
}

/// Caps how long SQLite retries a locked database before reporting busy.
fn limit_busy_wait(conn: &Connection, budget: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(budget.min(MAX_BUSY_WAIT))
}

fn disarm_deadline(conn: &Connection) {
    conn.progress_handler(0, None::<fn() -> bool>);
}
