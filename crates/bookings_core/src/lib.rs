//! Core data-access layer for hotel bookings.
//! This crate is the single source of truth for schema and storage invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{Config, ConfigError, ConnectionDescriptor, DEFAULT_DEADLINE, MAX_DEADLINE_SECS};
pub use db::{Database, OpenOptions, Operation, Verb};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use logging::{default_log_level, init_logging, logging_status, EventLog};
pub use model::{
    EntityKind, Hotel, HotelFields, RecordId, Room, RoomFields, Visitor, VisitorFields,
};
pub use repo::{
    CrudRepository, Repository, SqliteHotelRepository, SqliteRoomRepository,
    SqliteVisitorRepository,
};
pub use service::{EntityService, Payload};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
