//! Backend construction from configuration

use crate::duckdb::DuckDbBackend;
use crate::error::{DbError, DbResult};
use crate::sqlite::SqliteBackend;
use crate::traits::MigrationBackend;
use tern_core::{DatabaseConfig, DbType};

/// Open the backend described by `config`.
///
/// The database location must be supplied by the caller; nothing is
/// hardcoded and no environment variable is read here.
pub fn open_backend(config: &DatabaseConfig) -> DbResult<Box<dyn MigrationBackend>> {
    let path = config
        .path
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| DbError::ConnectionError("no database path configured".to_string()))?;

    log::debug!("Opening {} database at {}", config.db_type, path);
    let backend: Box<dyn MigrationBackend> = match config.db_type {
        DbType::Sqlite => Box::new(SqliteBackend::new(
            path,
            config.sqlite.clone(),
            config.create_if_missing,
        )?),
        DbType::DuckDb => Box::new(DuckDbBackend::new(path, config.create_if_missing)?),
    };
    Ok(backend)
}
