//! Error translation for the data-access layer.
//!
//! # Responsibility
//! - Wrap every storage failure with the operation tag that produced it.
//! - Keep "row does not exist" distinguishable from other failures.
//!
//! # Invariants
//! - Every variant carries an operation tag (`op`), except schema version
//!   mismatches detected before any operation runs.
//! - No failure is mapped to success; callers decide the transport status.

use crate::model::{EntityKind, RecordId};
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse failure class exposed to callers.
///
/// The calling layer maps these to its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Descriptor invalid or store unreachable. Fatal to startup.
    ConnectionFailed,
    /// A migration step failed or the schema is from the future. Fatal to startup.
    MigrationFailed,
    /// The targeted row does not exist.
    NotFound,
    /// Statement execution failed (constraint violation, timeout, I/O).
    ExecutionFailed,
    /// A record could not be encoded for transmission.
    SerializationFailed,
}

#[derive(Debug)]
pub enum StoreError {
    ConnectionFailed {
        op: &'static str,
        reason: String,
        source: Option<rusqlite::Error>,
    },
    MigrationFailed {
        op: &'static str,
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    NotFound {
        op: &'static str,
        entity: EntityKind,
        id: RecordId,
    },
    ExecutionFailed {
        op: &'static str,
        source: rusqlite::Error,
    },
    TimedOut {
        op: &'static str,
        deadline: Duration,
    },
    SerializationFailed {
        op: &'static str,
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Wraps a driver error raised while executing `op`.
    ///
    /// Interrupts raised by the deadline progress handler, and lock waits the
    /// busy handler gave up on, become `TimedOut`.
    pub(crate) fn execution(op: &'static str, deadline: Duration, source: rusqlite::Error) -> Self {
        match sqlite_code(&source) {
            Some(
                ErrorCode::OperationInterrupted
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked,
            ) => Self::TimedOut { op, deadline },
            _ => Self::ExecutionFailed { op, source },
        }
    }

    pub(crate) fn connection(op: &'static str, reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            op,
            reason: reason.into(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionFailed { .. } => ErrorKind::ConnectionFailed,
            Self::MigrationFailed { .. } | Self::UnsupportedSchemaVersion { .. } => {
                ErrorKind::MigrationFailed
            }
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ExecutionFailed { .. } | Self::TimedOut { .. } => ErrorKind::ExecutionFailed,
            Self::SerializationFailed { .. } => ErrorKind::SerializationFailed,
        }
    }

    /// Operation tag that produced this error.
    pub fn op(&self) -> &'static str {
        match self {
            Self::ConnectionFailed { op, .. }
            | Self::MigrationFailed { op, .. }
            | Self::NotFound { op, .. }
            | Self::ExecutionFailed { op, .. }
            | Self::TimedOut { op, .. }
            | Self::SerializationFailed { op, .. } => op,
            Self::UnsupportedSchemaVersion { .. } => "db.migrate",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Returns `true` for unique, check, not-null and foreign-key violations.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::ExecutionFailed { source, .. } => {
                sqlite_code(source) == Some(ErrorCode::ConstraintViolation)
            }
            _ => false,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed {
                op,
                reason,
                source: Some(err),
            } => write!(f, "{op}: connection failed: {reason}: {err}"),
            Self::ConnectionFailed {
                op,
                reason,
                source: None,
            } => write!(f, "{op}: connection failed: {reason}"),
            Self::MigrationFailed {
                op,
                version,
                name,
                source,
            } => write!(f, "{op}: migration {version:04} `{name}` failed: {source}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::NotFound { op, entity, id } => write!(f, "{op}: {entity} not found: {id}"),
            Self::ExecutionFailed { op, source } => write!(f, "{op}: execution failed: {source}"),
            Self::TimedOut { op, deadline } => write!(
                f,
                "{op}: deadline of {}ms exceeded",
                deadline.as_millis()
            ),
            Self::SerializationFailed { op, source } => {
                write!(f, "{op}: serialization failed: {source}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConnectionFailed { source, .. } => {
                source.as_ref().map(|err| err as &(dyn Error + 'static))
            }
            Self::MigrationFailed { source, .. } | Self::ExecutionFailed { source, .. } => {
                Some(source)
            }
            Self::SerializationFailed { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } | Self::NotFound { .. } | Self::TimedOut { .. } => {
                None
            }
        }
    }
}

fn sqlite_code(err: &rusqlite::Error) -> Option<ErrorCode> {
    match err {
        rusqlite::Error::SqliteFailure(inner, _) => Some(inner.code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, StoreError};
    use crate::model::EntityKind;
    use rusqlite::ffi;
    use std::time::Duration;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn interrupt_maps_to_timeout_with_execution_kind() {
        let err = StoreError::execution(
            "get_hotel",
            Duration::from_secs(5),
            sqlite_failure(ffi::SQLITE_INTERRUPT),
        );
        assert!(err.is_timeout());
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
        assert_eq!(err.op(), "get_hotel");
    }

    #[test]
    fn busy_and_locked_map_to_timeout() {
        for code in [ffi::SQLITE_BUSY, ffi::SQLITE_LOCKED] {
            let err = StoreError::execution("update_room", Duration::from_secs(1), sqlite_failure(code));
            assert!(err.is_timeout(), "code {code}");
            assert_eq!(err.to_string(), "update_room: deadline of 1000ms exceeded");
        }
    }

    #[test]
    fn constraint_failure_is_flagged() {
        let err = StoreError::execution(
            "create_hotel",
            Duration::from_secs(5),
            sqlite_failure(ffi::SQLITE_CONSTRAINT_UNIQUE),
        );
        assert!(err.is_constraint_violation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_display_names_operation_entity_and_id() {
        let err = StoreError::NotFound {
            op: "delete_room",
            entity: EntityKind::Room,
            id: 42,
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "delete_room: room not found: 42");
    }

    #[test]
    fn unsupported_version_is_a_migration_failure() {
        let err = StoreError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 4,
        };
        assert_eq!(err.kind(), ErrorKind::MigrationFailed);
        assert_eq!(err.op(), "db.migrate");
    }
}
