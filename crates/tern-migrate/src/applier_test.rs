use super::*;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tern_core::{MigrationName, SqliteSettings};
use tern_db::SqliteBackend;

fn setup() -> (TempDir, SqliteBackend) {
    let dir = TempDir::new().unwrap();
    let db = SqliteBackend::in_memory(SqliteSettings::default()).unwrap();
    (dir, db)
}

fn script(dir: &Path, name: &str, sql: &str) -> MigrationFile {
    let path = dir.join(name);
    fs::write(&path, sql).unwrap();
    MigrationFile {
        name: MigrationName::new(name),
        path,
    }
}

fn store(db: &SqliteBackend) -> VersioningStore<'_> {
    let store = VersioningStore::new(db, "schema_migrations").unwrap();
    store.ensure_initialized().unwrap();
    store
}

#[test]
fn test_applies_and_records() {
    let (dir, db) = setup();
    let store = store(&db);
    let file = script(
        dir.path(),
        "0001_users.sql",
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);\nINSERT INTO users (name) VALUES ('a');",
    );

    apply_migration(&db, &store, &file, None).unwrap();

    assert!(store.is_applied("0001_users.sql").unwrap());
    assert_eq!(db.query_count("SELECT COUNT(*) FROM users", &[]).unwrap(), 1);
}

#[test]
fn test_failing_statement_rolls_back_everything() {
    let (dir, db) = setup();
    let store = store(&db);
    let file = script(
        dir.path(),
        "0001_bad.sql",
        "CREATE TABLE good (id INT);\nINSERT INTO missing_table VALUES (1);",
    );

    let err = apply_migration(&db, &store, &file, None).unwrap_err();
    match err {
        MigrateError::Apply {
            name,
            cause: ApplyCause::Statement { index, statement, .. },
        } => {
            assert_eq!(name, "0001_bad.sql");
            assert_eq!(index, 2);
            assert_eq!(statement, "INSERT INTO missing_table VALUES (1)");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(!db.relation_exists("good").unwrap());
    assert!(!store.is_applied("0001_bad.sql").unwrap());
}

#[test]
fn test_split_error_executes_nothing() {
    let (dir, db) = setup();
    let store = store(&db);
    let file = script(
        dir.path(),
        "0001_split.sql",
        "CREATE TABLE first (id INT);\nINSERT INTO first VALUES ('unterminated);",
    );

    let err = apply_migration(&db, &store, &file, None).unwrap_err();
    assert!(
        matches!(
            err,
            MigrateError::Apply {
                cause: ApplyCause::Split(_),
                ..
            }
        ),
        "got {err:?}"
    );
    assert!(!db.relation_exists("first").unwrap());
}

#[test]
fn test_missing_script_is_read_error() {
    let (dir, db) = setup();
    let store = store(&db);
    let file = MigrationFile {
        name: MigrationName::new("0001_gone.sql"),
        path: dir.path().join("0001_gone.sql"),
    };

    let err = apply_migration(&db, &store, &file, None).unwrap_err();
    assert!(matches!(
        err,
        MigrateError::Apply {
            cause: ApplyCause::Read(_),
            ..
        }
    ));
}

#[test]
fn test_already_recorded_is_duplicate_and_rolled_back() {
    let (dir, db) = setup();
    let store = store(&db);
    store.record_applied("0001_dup.sql", Utc::now()).unwrap();
    let file = script(dir.path(), "0001_dup.sql", "CREATE TABLE dup (id INT);");

    let err = apply_migration(&db, &store, &file, None).unwrap_err();
    assert!(
        matches!(err, MigrateError::DuplicateRecord { ref name } if name == "0001_dup.sql"),
        "got {err:?}"
    );
    assert!(!db.relation_exists("dup").unwrap());
}

#[test]
fn test_expired_deadline_applies_nothing() {
    let (dir, db) = setup();
    let store = store(&db);
    let file = script(dir.path(), "0001_late.sql", "CREATE TABLE late (id INT);");
    let deadline = Instant::now() - Duration::from_millis(1);

    let err = apply_migration(&db, &store, &file, Some(deadline)).unwrap_err();
    assert!(matches!(
        err,
        MigrateError::Apply {
            cause: ApplyCause::DeadlineExceeded,
            ..
        }
    ));
    assert!(!db.relation_exists("late").unwrap());
    assert!(!store.is_applied("0001_late.sql").unwrap());
}

#[test]
fn test_trigger_script_applies() {
    let (dir, db) = setup();
    let store = store(&db);
    let file = script(
        dir.path(),
        "0001_audit.sql",
        "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT);
CREATE TABLE audit (item_id INTEGER);
CREATE TRIGGER items_audit AFTER INSERT ON items
BEGIN
    INSERT INTO audit (item_id) VALUES (NEW.id);
END;
INSERT INTO items (name) VALUES ('x; y');",
    );

    apply_migration(&db, &store, &file, None).unwrap();
    assert_eq!(db.query_count("SELECT COUNT(*) FROM audit", &[]).unwrap(), 1);
}

#[test]
fn test_empty_script_is_recorded() {
    let (dir, db) = setup();
    let store = store(&db);
    let file = script(dir.path(), "0001_empty.sql", "-- nothing yet\n");

    apply_migration(&db, &store, &file, None).unwrap();
    assert!(store.is_applied("0001_empty.sql").unwrap());
}
