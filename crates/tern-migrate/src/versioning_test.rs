use super::*;
use chrono::TimeZone;
use tern_core::SqliteSettings;
use tern_db::{DuckDbBackend, SqliteBackend};

fn sqlite() -> SqliteBackend {
    SqliteBackend::in_memory(SqliteSettings::default()).unwrap()
}

#[test]
fn test_rejects_non_identifier_table() {
    let db = sqlite();
    let err = VersioningStore::new(&db, "bad name; DROP").err().unwrap();
    assert!(matches!(err, DbError::InvalidIdentifier(_)));
}

#[test]
fn test_ensure_initialized_is_idempotent() {
    let db = sqlite();
    let store = VersioningStore::new(&db, "schema_migrations").unwrap();
    store.ensure_initialized().unwrap();
    store.record_applied("0001_init.sql", Utc::now()).unwrap();
    store.ensure_initialized().unwrap();
    assert!(store.is_applied("0001_init.sql").unwrap());
}

#[test]
fn test_record_and_lookup() {
    let db = sqlite();
    let store = VersioningStore::new(&db, "schema_migrations").unwrap();
    store.ensure_initialized().unwrap();

    assert!(!store.is_applied("0001_init.sql").unwrap());
    store.record_applied("0001_init.sql", Utc::now()).unwrap();
    assert!(store.is_applied("0001_init.sql").unwrap());
    assert!(!store.is_applied("0002_next.sql").unwrap());
}

#[test]
fn test_duplicate_record_is_constraint_violation() {
    let db = sqlite();
    let store = VersioningStore::new(&db, "schema_migrations").unwrap();
    store.ensure_initialized().unwrap();
    store.record_applied("0001_init.sql", Utc::now()).unwrap();

    let err = store
        .record_applied("0001_init.sql", Utc::now())
        .unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(_)), "got {err:?}");
}

#[test]
fn test_applied_records_round_trip_timestamp() {
    let db = sqlite();
    let store = VersioningStore::new(&db, "schema_migrations").unwrap();
    store.ensure_initialized().unwrap();

    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap();
    store.record_applied("0002_b.sql", at).unwrap();
    store.record_applied("0001_a.sql", at).unwrap();

    let records = store.applied_records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "0001_a.sql");
    assert_eq!(records[1].name, "0002_b.sql");
    assert_eq!(records[0].applied_at, at);
}

#[test]
fn test_default_timestamp_is_readable() {
    let db = sqlite();
    let store = VersioningStore::new(&db, "schema_migrations").unwrap();
    store.ensure_initialized().unwrap();
    db.execute_batch("INSERT INTO schema_migrations (filename) VALUES ('external.sql')")
        .unwrap();

    let records = store.applied_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "external.sql");
}

#[test]
fn test_clear_all_only_touches_bookkeeping() {
    let db = sqlite();
    let store = VersioningStore::new(&db, "schema_migrations").unwrap();
    store.ensure_initialized().unwrap();
    db.execute_batch("CREATE TABLE users (id INT); INSERT INTO users VALUES (1);")
        .unwrap();
    store.record_applied("0001_a.sql", Utc::now()).unwrap();
    store.record_applied("0002_b.sql", Utc::now()).unwrap();

    assert_eq!(store.clear_all().unwrap(), 2);
    assert!(store.applied_records().unwrap().is_empty());
    assert_eq!(db.query_count("SELECT COUNT(*) FROM users", &[]).unwrap(), 1);
}

#[test]
fn test_custom_table_name() {
    let db = sqlite();
    let store = VersioningStore::new(&db, "tern_history").unwrap();
    store.ensure_initialized().unwrap();
    assert!(db.relation_exists("tern_history").unwrap());
    assert!(!db.relation_exists("schema_migrations").unwrap());
}

#[test]
fn test_duckdb_store() {
    let db = DuckDbBackend::in_memory().unwrap();
    let store = VersioningStore::new(&db, "schema_migrations").unwrap();
    store.ensure_initialized().unwrap();

    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap();
    store.record_applied("0001_a.sql", at).unwrap();
    assert!(store.is_applied("0001_a.sql").unwrap());

    let err = store.record_applied("0001_a.sql", at).unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(_)), "got {err:?}");

    let records = store.applied_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].applied_at, at);
}
