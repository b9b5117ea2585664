//! Run orchestration: initialize, optionally reset, discover, apply in order.

use crate::applier::apply_migration;
use crate::error::{MigrateError, MigrateResult};
use crate::report::{
    MigrationFailure, MigrationState, MigrationStatus, RunPhase, RunReport, RunStatus,
    StatusReport,
};
use crate::reset::reset_all;
use crate::versioning::VersioningStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tern_core::config::DEFAULT_BOOKKEEPING_TABLE;
use tern_core::{
    discover_migrations, ensure_migrations_dir, Config, CoreError, DatabaseConfig, MigrationFile,
};
use tern_db::{open_backend, MigrationBackend};

/// Options for a single [`Runner::run`] call
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Drop every managed relation and clear the bookkeeping table first
    pub reset: bool,
    /// Point in time after which no further work is started
    pub deadline: Option<Instant>,
}

impl RunOptions {
    /// Set the deadline to `timeout` from now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }
}

/// Open the configured database, mapping failures to
/// [`MigrateError::DatabaseUnavailable`].
pub fn open_database(config: &DatabaseConfig) -> MigrateResult<Box<dyn MigrationBackend>> {
    open_backend(config).map_err(MigrateError::DatabaseUnavailable)
}

/// Applies the scripts of one directory to one database.
#[derive(Debug, Clone)]
pub struct Runner {
    migrations_dir: PathBuf,
    extension: String,
    bookkeeping_table: String,
}

impl Runner {
    /// Runner for `migrations_dir` with default extension and table name
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            extension: "sql".to_string(),
            bookkeeping_table: DEFAULT_BOOKKEEPING_TABLE.to_string(),
        }
    }

    /// Runner from a loaded config, resolving a relative migrations
    /// directory against `base`
    pub fn from_config(config: &Config, base: &Path) -> Self {
        Self {
            migrations_dir: config.migrations_path(base),
            extension: config.extension.clone(),
            bookkeeping_table: config.bookkeeping_table.clone(),
        }
    }

    /// Only files ending in `.{extension}` are discovered
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Record applied migrations in `table` instead of the default
    pub fn with_bookkeeping_table(mut self, table: impl Into<String>) -> Self {
        self.bookkeeping_table = table.into();
        self
    }

    /// Directory the scripts are read from
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Fail with [`MigrateError::DirectoryNotFound`] unless the migrations
    /// directory exists. Call before opening the database.
    pub fn check_migrations_dir(&self) -> MigrateResult<()> {
        ensure_migrations_dir(&self.migrations_dir).map_err(directory_error)
    }

    /// Apply every unrecorded migration in filename order.
    ///
    /// Errors before the first migration (missing directory, bookkeeping
    /// setup, reset, discovery) are returned as `Err`. A failing migration
    /// halts the run and is reported through [`RunReport::failure`].
    pub fn run(&self, db: &dyn MigrationBackend, options: RunOptions) -> MigrateResult<RunReport> {
        let mut phase = PhaseTracker::default();
        self.check_migrations_dir()?;

        phase.enter(RunPhase::Initializing);
        let store = self.init_store(db)?;

        if options.reset {
            phase.enter(RunPhase::Resetting);
            reset_all(db, &store)?;
        }
        let mut report = RunReport::new(options.reset);

        phase.enter(RunPhase::Discovering);
        let files = self.discover()?;
        log::debug!(
            "Found {} migration(s) in {}",
            files.len(),
            self.migrations_dir.display()
        );

        for (i, file) in files.iter().enumerate() {
            phase.enter(RunPhase::Applying(i + 1));
            let outcome = match store.is_applied(&file.name) {
                Ok(true) => {
                    log::debug!("={} already applied", file.name);
                    report.skipped.push(file.name.clone());
                    continue;
                }
                Ok(false) => apply_migration(db, &store, file, options.deadline),
                Err(e) => Err(MigrateError::Store(e)),
            };

            match outcome {
                Ok(()) => report.applied.push(file.name.clone()),
                Err(error) => {
                    report.status = RunStatus::Failed;
                    report.failure = Some(MigrationFailure {
                        name: file.name.clone(),
                        error,
                    });
                    report.not_attempted = files[i + 1..].iter().map(|f| f.name.clone()).collect();
                    phase.enter(RunPhase::Failed);
                    return Ok(report);
                }
            }
        }

        phase.enter(RunPhase::Done);
        log::info!(
            "{} applied, {} already applied",
            report.applied_count(),
            report.skipped_count()
        );
        Ok(report)
    }

    /// Applied state of every discovered migration, plus recorded
    /// filenames that no longer have a script.
    pub fn status(&self, db: &dyn MigrationBackend) -> MigrateResult<StatusReport> {
        self.check_migrations_dir()?;
        let store = self.init_store(db)?;
        let files = self.discover()?;

        let mut recorded: BTreeMap<_, _> = store
            .applied_records()
            .map_err(MigrateError::Store)?
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect();

        let migrations = files
            .into_iter()
            .map(|file| {
                let status = match recorded.remove(file.name.as_str()) {
                    Some(record) => MigrationStatus::Applied {
                        applied_at: record.applied_at,
                    },
                    None => MigrationStatus::Pending,
                };
                MigrationState {
                    name: file.name,
                    status,
                }
            })
            .collect();

        Ok(StatusReport {
            migrations,
            orphaned: recorded.into_values().collect(),
        })
    }

    fn init_store<'a>(&self, db: &'a dyn MigrationBackend) -> MigrateResult<VersioningStore<'a>> {
        let store = VersioningStore::new(db, &self.bookkeeping_table).map_err(MigrateError::Init)?;
        store.ensure_initialized().map_err(MigrateError::Init)?;
        Ok(store)
    }

    fn discover(&self) -> MigrateResult<Vec<MigrationFile>> {
        discover_migrations(&self.migrations_dir, &self.extension).map_err(directory_error)
    }
}

fn directory_error(err: CoreError) -> MigrateError {
    match err {
        CoreError::DirectoryNotFound { path } | CoreError::NotADirectory { path } => {
            MigrateError::DirectoryNotFound { path }
        }
        other => MigrateError::Core(other),
    }
}

#[derive(Default)]
struct PhaseTracker {
    current: Option<RunPhase>,
}

impl PhaseTracker {
    fn enter(&mut self, next: RunPhase) {
        let from = self.current.unwrap_or(RunPhase::Idle);
        log::debug!("Runner phase: {from} -> {next}");
        self.current = Some(next);
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
