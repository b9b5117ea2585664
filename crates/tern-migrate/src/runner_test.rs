use super::*;
use std::fs;
use crate::test_support::FaultyBackend;
use tempfile::TempDir;
use tern_core::{MigrationName, SqliteSettings};
use tern_db::SqliteBackend;

fn sqlite() -> SqliteBackend {
    SqliteBackend::in_memory(SqliteSettings::default()).unwrap()
}

#[test]
fn test_missing_directory_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let db = sqlite();
    let runner = Runner::new(dir.path().join("migrations"));

    let err = runner.run(&db, RunOptions::default()).unwrap_err();
    assert!(matches!(err, MigrateError::DirectoryNotFound { .. }), "got {err:?}");
    // Bookkeeping table was never created
    assert!(!db.relation_exists("schema_migrations").unwrap());
}

#[test]
fn test_file_as_directory_is_directory_not_found() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("migrations");
    fs::write(&path, "not a dir").unwrap();

    let err = Runner::new(&path).check_migrations_dir().unwrap_err();
    assert!(matches!(err, MigrateError::DirectoryNotFound { .. }));
}

#[test]
fn test_empty_directory_is_done() {
    let dir = TempDir::new().unwrap();
    let db = sqlite();

    let report = Runner::new(dir.path()).run(&db, RunOptions::default()).unwrap();
    assert!(report.is_success());
    assert_eq!(report.applied_count(), 0);
    assert_eq!(report.skipped_count(), 0);
    assert!(!report.reset_performed);
}

#[test]
fn test_invalid_table_is_init_error() {
    let dir = TempDir::new().unwrap();
    let db = sqlite();
    let runner = Runner::new(dir.path()).with_bookkeeping_table("no good");

    let err = runner.run(&db, RunOptions::default()).unwrap_err();
    assert!(matches!(err, MigrateError::Init(_)));
}

#[test]
fn test_custom_extension() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("0001_a.up"), "CREATE TABLE a (id INT);").unwrap();
    fs::write(dir.path().join("0002_b.sql"), "CREATE TABLE b (id INT);").unwrap();
    let db = sqlite();

    let report = Runner::new(dir.path())
        .with_extension("up")
        .run(&db, RunOptions::default())
        .unwrap();
    assert_eq!(report.applied, vec![MigrationName::new("0001_a.up")]);
    assert!(!db.relation_exists("b").unwrap());
}

#[test]
fn test_from_config_resolves_relative_dir() {
    let base = TempDir::new().unwrap();
    let config = Config {
        migrations_dir: "db/migrations".to_string(),
        bookkeeping_table: "history".to_string(),
        ..Config::default()
    };
    let runner = Runner::from_config(&config, base.path());
    assert_eq!(runner.migrations_dir(), base.path().join("db/migrations"));
}

#[test]
fn test_status_lists_pending_applied_and_orphaned() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("0001_a.sql"), "CREATE TABLE a (id INT);").unwrap();
    let db = sqlite();
    let runner = Runner::new(dir.path());
    runner.run(&db, RunOptions::default()).unwrap();

    fs::write(dir.path().join("0002_b.sql"), "CREATE TABLE b (id INT);").unwrap();
    db.execute_batch("INSERT INTO schema_migrations (filename) VALUES ('0000_removed.sql')")
        .unwrap();

    let status = runner.status(&db).unwrap();
    assert_eq!(status.migrations.len(), 2);
    assert!(matches!(
        status.migrations[0].status,
        MigrationStatus::Applied { .. }
    ));
    assert_eq!(status.migrations[1].status, MigrationStatus::Pending);
    assert_eq!(status.pending_count(), 1);
    assert_eq!(status.orphaned.len(), 1);
    assert_eq!(status.orphaned[0].name, "0000_removed.sql");
}

#[test]
fn test_record_written_concurrently_is_duplicate_failure() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("0001_widgets.sql"), "CREATE TABLE widgets (id INT);").unwrap();
    fs::write(dir.path().join("0002_gadgets.sql"), "CREATE TABLE gadgets (id INT);").unwrap();
    // Another writer records 0001 after our is_applied check, before BEGIN
    let db = FaultyBackend::new().with_write_before_begin(
        "INSERT INTO schema_migrations (filename, applied_at)
         VALUES ('0001_widgets.sql', '2024-01-01 00:00:00')",
    );

    let report = Runner::new(dir.path()).run(&db, RunOptions::default()).unwrap();

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.applied.is_empty());
    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.name, MigrationName::new("0001_widgets.sql"));
    assert!(
        matches!(&failure.error, MigrateError::DuplicateRecord { name } if name.as_str() == "0001_widgets.sql"),
        "got {:?}",
        failure.error
    );
    assert_eq!(report.not_attempted, vec![MigrationName::new("0002_gadgets.sql")]);
    // The script's own work was rolled back with the failed insert
    assert!(!db.relation_exists("widgets").unwrap());
}

#[test]
fn test_with_timeout_sets_deadline() {
    let options = RunOptions::default().with_timeout(Duration::from_secs(30));
    assert!(options.deadline.is_some());
    assert!(!options.reset);
}

#[test]
fn test_phase_display() {
    assert_eq!(RunPhase::Applying(3).to_string(), "applying(3)");
    assert_eq!(RunPhase::Initializing.to_string(), "initializing");
}
