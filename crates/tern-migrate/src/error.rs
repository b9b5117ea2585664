//! Error types for the migration runner.

use tern_core::{CoreError, MigrationName};
use tern_db::DbError;
use thiserror::Error;

/// Why a single migration's unit of work was rolled back.
#[derive(Error, Debug)]
pub enum ApplyCause {
    /// The script could not be read from disk.
    #[error("failed to read script: {0}")]
    Read(#[source] CoreError),

    /// The script could not be split into statements; nothing was executed.
    #[error("{0}")]
    Split(#[source] CoreError),

    /// A statement of the script failed.
    #[error("statement {index} failed: {source}\n    {statement}")]
    Statement {
        /// 1-based position of the statement in the script
        index: usize,
        /// Statement text as it appears in the script
        statement: String,
        /// Database error
        source: DbError,
    },

    /// The bookkeeping insert failed.
    #[error("failed to record migration: {0}")]
    Record(#[source] DbError),

    /// BEGIN or COMMIT failed.
    #[error("{0}")]
    Transaction(#[source] DbError),

    /// The run deadline passed before the unit of work could commit.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl From<DbError> for ApplyCause {
    fn from(err: DbError) -> Self {
        ApplyCause::Transaction(err)
    }
}

/// Migration runner errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Migrations directory is missing (R001).
    #[error("[R001] Migrations directory not found: {path}")]
    DirectoryNotFound { path: String },

    /// The target database cannot be opened (R002).
    #[error("[R002] Database unavailable: {0}")]
    DatabaseUnavailable(#[source] DbError),

    /// Bookkeeping table or connection setup failed (R003).
    #[error("[R003] Failed to initialize bookkeeping table: {0}")]
    Init(#[source] DbError),

    /// A migration failed and was rolled back (R004).
    #[error("[R004] Migration '{name}' failed: {cause}")]
    Apply {
        name: MigrationName,
        #[source]
        cause: ApplyCause,
    },

    /// The migration was recorded by someone else between the skip check
    /// and the insert (R005).
    #[error("[R005] Migration '{name}' is already recorded as applied")]
    DuplicateRecord { name: MigrationName },

    /// Dropping a relation or clearing the bookkeeping table failed (R006).
    #[error("[R006] Reset failed on '{target}': {source}")]
    Reset { target: String, source: DbError },

    /// Reading the bookkeeping table failed (R007).
    #[error("[R007] Bookkeeping query failed: {0}")]
    Store(#[source] DbError),

    /// Discovery or configuration error (R008).
    #[error("[R008] {0}")]
    Core(#[from] CoreError),
}

impl MigrateError {
    /// Filename of the migration this error is about, if any
    pub fn migration_name(&self) -> Option<&MigrationName> {
        match self {
            MigrateError::Apply { name, .. } | MigrateError::DuplicateRecord { name } => Some(name),
            _ => None,
        }
    }
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
