//! Bookkeeping table that records which migrations have been applied.

use chrono::{DateTime, NaiveDateTime, Utc};
use tern_core::{is_plain_identifier, DbType, MigrationName};
use tern_db::{DbError, DbResult, MigrationBackend};

/// Format used for `applied_at` values written by [`VersioningStore::record_applied`]
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Format accepted when reading `applied_at` back; the fraction is optional
/// so rows filled by `DEFAULT CURRENT_TIMESTAMP` parse too.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One row of the bookkeeping table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRecord {
    /// Migration filename
    pub name: MigrationName,
    /// When the migration committed, in UTC
    pub applied_at: DateTime<Utc>,
}

/// Owns the bookkeeping table on one connection.
pub struct VersioningStore<'a> {
    db: &'a dyn MigrationBackend,
    table: String,
}

impl<'a> VersioningStore<'a> {
    /// Create a store for `table`, which must be a plain identifier.
    pub fn new(db: &'a dyn MigrationBackend, table: &str) -> DbResult<Self> {
        if !is_plain_identifier(table) {
            return Err(DbError::InvalidIdentifier(table.to_string()));
        }
        Ok(Self {
            db,
            table: table.to_string(),
        })
    }

    /// Name of the bookkeeping table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Configure the connection and create the bookkeeping table if absent.
    ///
    /// Safe to call on every run.
    pub fn ensure_initialized(&self) -> DbResult<()> {
        self.db.configure()?;
        self.db.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                filename TEXT PRIMARY KEY,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            self.table
        ))?;
        log::debug!("Bookkeeping table '{}' ready", self.table);
        Ok(())
    }

    /// Whether `name` is recorded as applied
    pub fn is_applied(&self, name: &str) -> DbResult<bool> {
        let count = self.db.query_count(
            &format!("SELECT COUNT(*) FROM {} WHERE filename = ?", self.table),
            &[name],
        )?;
        Ok(count > 0)
    }

    /// Insert the record for `name`.
    ///
    /// Must run inside the same transaction as the migration's statements.
    /// An existing row for `name` yields [`DbError::ConstraintViolation`].
    pub fn record_applied(&self, name: &str, applied_at: DateTime<Utc>) -> DbResult<()> {
        let value = match self.db.db_type() {
            // SQLite keeps the text as-is; a CAST would give it NUMERIC affinity
            DbType::Sqlite => "?",
            DbType::DuckDb => "CAST(? AS TIMESTAMP)",
        };
        let timestamp = applied_at.format(TIMESTAMP_FORMAT).to_string();
        self.db.execute_with_params(
            &format!(
                "INSERT INTO {} (filename, applied_at) VALUES (?, {})",
                self.table, value
            ),
            &[name, timestamp.as_str()],
        )?;
        Ok(())
    }

    /// Delete every row of the bookkeeping table, returning the number removed
    pub fn clear_all(&self) -> DbResult<usize> {
        self.db
            .execute_with_params(&format!("DELETE FROM {}", self.table), &[])
    }

    /// All records ordered by filename
    pub fn applied_records(&self) -> DbResult<Vec<AppliedRecord>> {
        let rows = self.db.query_rows(
            &format!(
                "SELECT filename, CAST(applied_at AS VARCHAR) FROM {} ORDER BY filename",
                self.table
            ),
            &[],
            2,
        )?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut cols = row.into_iter();
            let filename = cols.next().flatten().unwrap_or_default();
            let raw = cols.next().flatten().unwrap_or_default();
            let Some(name) = MigrationName::try_new(filename.clone()) else {
                return Err(DbError::ExecutionError(format!(
                    "invalid filename '{filename}' in {}",
                    self.table
                )));
            };
            let applied_at = parse_timestamp(&raw).ok_or_else(|| {
                DbError::ExecutionError(format!(
                    "unreadable applied_at '{raw}' for '{name}' in {}",
                    self.table
                ))
            })?;
            records.push(AppliedRecord { name, applied_at });
        }
        Ok(records)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_PARSE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[path = "versioning_test.rs"]
mod tests;
