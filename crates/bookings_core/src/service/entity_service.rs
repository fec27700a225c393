//! Entity use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for callers.
//! - Serialize read results so callers can forward them unchanged.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Every error carries the operation tag of the call that produced it.

use crate::db::{Operation, Verb};
use crate::error::{StoreError, StoreResult};
use crate::model::RecordId;
use crate::repo::CrudRepository;
use serde::Serialize;
use std::fmt;

/// JSON document produced by a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(String);

impl Payload {
    fn encode<T: Serialize + ?Sized>(op: &'static str, value: &T) -> StoreResult<Self> {
        serde_json::to_string(value)
            .map(Self)
            .map_err(|source| StoreError::SerializationFailed { op, source })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Use-case service wrapper for one entity's CRUD operations.
pub struct EntityService<R: CrudRepository> {
    repo: R,
}

impl<R> EntityService<R>
where
    R: CrudRepository,
    R::Record: Serialize,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a record and returns its generated id.
    pub fn create(&self, fields: &R::Fields) -> StoreResult<RecordId> {
        self.repo.create(fields)
    }

    pub fn get_by_id(&self, id: RecordId) -> StoreResult<Payload> {
        let record = self.repo.get_by_id(id)?;
        Payload::encode(op_name::<R>(Verb::Get), &record)
    }

    /// Every record as a JSON array; `[]` when the table is empty.
    pub fn get_all(&self) -> StoreResult<Payload> {
        let records = self.repo.get_all()?;
        Payload::encode(op_name::<R>(Verb::List), records.as_slice())
    }

    /// Replaces the record and returns it as stored after the write.
    pub fn update(&self, id: RecordId, fields: &R::Fields) -> StoreResult<Payload> {
        let record = self.repo.update(id, fields)?;
        Payload::encode(op_name::<R>(Verb::Update), &record)
    }

    pub fn delete(&self, id: RecordId) -> StoreResult<()> {
        self.repo.delete(id)
    }
}

fn op_name<R: CrudRepository>(verb: Verb) -> &'static str {
    Operation::new(R::ENTITY, verb).name()
}

#[cfg(test)]
mod tests {
    use super::{EntityService, Payload};
    use crate::error::{ErrorKind, StoreError, StoreResult};
    use crate::model::{EntityKind, RecordId};
    use crate::repo::CrudRepository;
    use serde::ser::{Error as _, Serializer};
    use serde::Serialize;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refused"))
        }
    }

    struct BrokenRepo;

    impl CrudRepository for BrokenRepo {
        type Record = Unencodable;
        type Fields = ();

        const ENTITY: EntityKind = EntityKind::Room;

        fn create(&self, _fields: &()) -> StoreResult<RecordId> {
            Ok(1)
        }

        fn get_by_id(&self, _id: RecordId) -> StoreResult<Unencodable> {
            Ok(Unencodable)
        }

        fn get_all(&self) -> StoreResult<Vec<Unencodable>> {
            Ok(Vec::new())
        }

        fn update(&self, _id: RecordId, _fields: &()) -> StoreResult<Unencodable> {
            Ok(Unencodable)
        }

        fn delete(&self, id: RecordId) -> StoreResult<()> {
            Err(StoreError::NotFound {
                op: "delete_room",
                entity: EntityKind::Room,
                id,
            })
        }
    }

    #[test]
    fn encoding_failure_is_tagged_with_operation() {
        let service = EntityService::new(BrokenRepo);
        let err = service.get_by_id(7).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SerializationFailed);
        assert_eq!(err.op(), "get_room");

        let err = service.update(7, &()).unwrap_err();
        assert_eq!(err.op(), "update_room");
    }

    #[test]
    fn empty_list_encodes_as_empty_array() {
        let service = EntityService::new(BrokenRepo);
        assert_eq!(service.get_all().unwrap().as_str(), "[]");
    }

    #[test]
    fn repository_errors_pass_through() {
        let service = EntityService::new(BrokenRepo);
        assert!(service.delete(3).unwrap_err().is_not_found());
        assert_eq!(service.create(&()).unwrap(), 1);
    }

    #[test]
    fn payload_displays_raw_json() {
        let payload = Payload::encode("test", &[1, 2]).unwrap();
        assert_eq!(payload.to_string(), "[1,2]");
        assert_eq!(payload.into_string(), "[1,2]");
    }
}
