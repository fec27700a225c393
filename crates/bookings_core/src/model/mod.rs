//! Domain records for hotels, rooms and visitors.
//!
//! # Responsibility
//! - Define the persisted record shapes and the caller-supplied field sets.
//! - Fix the JSON encoding callers forward to clients.
//!
//! # Invariants
//! - Ids are generated by the store and never supplied on create.
//! - Field sets carry every mutable column; updates replace the full row.
//! - Range and uniqueness rules are enforced by schema constraints, not here.

use std::fmt::{Display, Formatter};

pub mod hotel;
pub mod room;
pub mod visitor;

pub use hotel::{Hotel, HotelFields};
pub use room::{Room, RoomFields};
pub use visitor::{Visitor, VisitorFields};

/// Store-generated primary key shared by all entities.
pub type RecordId = i64;

/// Persisted entity type, used to label errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Hotel,
    Room,
    Visitor,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hotel => "hotel",
            Self::Room => "room",
            Self::Visitor => "visitor",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
