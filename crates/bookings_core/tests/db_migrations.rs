use bookings_core::db::migrations::latest_version;
use bookings_core::{
    ConnectionDescriptor, CrudRepository, Database, ErrorKind, EventLog, HotelFields, OpenOptions,
    Repository, StoreError,
};
use rusqlite::Connection;
use std::path::Path;

fn open_file(path: &Path, reload: bool) -> Result<Database, StoreError> {
    let options = OpenOptions {
        reload,
        ..OpenOptions::default()
    };
    Database::open(
        &ConnectionDescriptor::File(path.to_path_buf()),
        &options,
        EventLog::discard(),
    )
}

#[test]
fn open_applies_all_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookings.sqlite3");

    let db = open_file(&path, false).unwrap();
    assert_eq!(db.schema_version().unwrap(), latest_version());
    drop(db);

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_object_exists(&conn, "table", "hotels");
    assert_object_exists(&conn, "table", "hotel_rooms");
    assert_object_exists(&conn, "table", "visitors");
    assert_object_exists(&conn, "index", "idx_hotel_rooms_hotel_id");
    assert_object_exists(&conn, "index", "idx_visitors_hotel_room_id");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookings.sqlite3");

    let first = Repository::new(open_file(&path, false).unwrap());
    first
        .hotels()
        .create(&HotelFields::new("Italy", "Rome", "Albergo", 3))
        .unwrap();
    let schema_before = schema_sql(&path);
    drop(first);

    let second = Repository::new(open_file(&path, false).unwrap());
    assert_eq!(second.database().schema_version().unwrap(), latest_version());
    assert_eq!(second.hotels().get_all().unwrap().len(), 1);
    drop(second);

    assert_eq!(schema_sql(&path), schema_before);
}

#[test]
fn reload_drops_data_and_reapplies_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookings.sqlite3");

    let repo = Repository::new(open_file(&path, false).unwrap());
    repo.hotels()
        .create(&HotelFields::new("Spain", "Madrid", "Palacio", 5))
        .unwrap();
    drop(repo);

    let reloaded = Repository::new(open_file(&path, true).unwrap());
    assert_eq!(reloaded.database().schema_version().unwrap(), latest_version());
    assert!(reloaded.hotels().get_all().unwrap().is_empty());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_file(&path, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MigrationFailed);
    match err {
        StoreError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failing_step_stops_migration_and_names_the_step() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clash.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE idx_visitors_hotel_id (id INTEGER);")
        .unwrap();
    drop(conn);

    let err = open_file(&path, false).unwrap_err();
    match &err {
        StoreError::MigrationFailed { version, name, .. } => {
            assert_eq!(*version, 4);
            assert_eq!(*name, "lookup_indexes");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("lookup_indexes"));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 3);
    assert_object_exists(&conn, "table", "visitors");
}

#[test]
fn revert_to_baseline_drops_every_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookings.sqlite3");

    let repo = Repository::new(open_file(&path, false).unwrap());
    assert_eq!(repo.database().revert_to(0).unwrap(), 0);
    assert_eq!(repo.database().schema_version().unwrap(), 0);

    let err = repo.hotels().get_all().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
    drop(repo);

    let conn = Connection::open(&path).unwrap();
    let tables: i64 = conn
        .query_row(
            "SELECT count(*) FROM sqlite_master
             WHERE type = 'table' AND name IN ('hotels', 'hotel_rooms', 'visitors');",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 0);
}

#[test]
fn partial_revert_keeps_earlier_steps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookings.sqlite3");

    let db = open_file(&path, false).unwrap();
    assert_eq!(db.revert_to(1).unwrap(), 1);
    drop(db);

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 1);
    assert_object_exists(&conn, "table", "hotels");
    drop(conn);

    let db = open_file(&path, false).unwrap();
    assert_eq!(db.schema_version().unwrap(), latest_version());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn schema_sql(path: &Path) -> Vec<String> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare("SELECT sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY name;")
        .unwrap();
    let rows = stmt.query_map([], |row| row.get(0)).unwrap();
    rows.collect::<Result<_, _>>().unwrap()
}

fn assert_object_exists(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
