//! Use-case services over the entity repositories.
//!
//! # Responsibility
//! - Turn repository records into ready-to-transmit JSON payloads.
//! - Keep callers (CLI, transport adapters) decoupled from storage details.

pub mod entity_service;

pub use entity_service::{EntityService, Payload};
