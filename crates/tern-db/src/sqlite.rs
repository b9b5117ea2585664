//! SQLite backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{MigrationBackend, Relation, RelationKind};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;
use tern_core::{DbType, SqliteSettings};

/// SQLite backend.
///
/// Single-threaded, no `Mutex` needed because migrations run sequentially.
pub struct SqliteBackend {
    conn: Connection,
    settings: SqliteSettings,
}

impl SqliteBackend {
    /// Create a new in-memory SQLite connection
    pub fn in_memory(settings: SqliteSettings) -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn, settings })
    }

    /// Open a SQLite database file.
    ///
    /// With `create_if_missing` unset, a missing file is a connection error
    /// instead of silently creating an empty database.
    pub fn from_path(
        path: &Path,
        settings: SqliteSettings,
        create_if_missing: bool,
    ) -> DbResult<Self> {
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if create_if_missing {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        } else if !path.exists() {
            return Err(DbError::ConnectionError(format!(
                "database file not found: {}",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self { conn, settings })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str, settings: SqliteSettings, create_if_missing: bool) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory(settings)
        } else {
            Self::from_path(Path::new(path), settings, create_if_missing)
        }
    }

    /// Borrow the underlying rusqlite connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Pragmas applied by [`MigrationBackend::configure`]
    fn pragma_sql(&self) -> String {
        let s = &self.settings;
        format!(
            "PRAGMA foreign_keys = {};
             PRAGMA journal_mode = {};
             PRAGMA synchronous = {};
             PRAGMA temp_store = {};
             PRAGMA cache_size = {};",
            if s.foreign_keys { "ON" } else { "OFF" },
            s.journal_mode.pragma_value(),
            s.synchronous.pragma_value(),
            s.temp_store.pragma_value(),
            s.cache_size,
        )
    }
}

impl MigrationBackend for SqliteBackend {
    fn db_type(&self) -> DbType {
        DbType::Sqlite
    }

    fn configure(&self) -> DbResult<()> {
        self.conn
            .execute_batch(&self.pragma_sql())
            .map_err(|e| DbError::ConnectionError(format!("failed to apply pragmas: {e}")))?;
        self.conn
            .busy_timeout(Duration::from_millis(self.settings.busy_timeout_ms))
            .map_err(|e| DbError::ConnectionError(format!("failed to set busy timeout: {e}")))?;
        log::debug!(
            "SQLite configured: journal_mode={}, busy_timeout={}ms",
            self.settings.journal_mode.pragma_value(),
            self.settings.busy_timeout_ms
        );
        Ok(())
    }

    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        Ok(self.conn.execute_batch(sql)?)
    }

    fn execute_with_params(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        Ok(self
            .conn
            .execute(sql, params_from_iter(params.iter().copied()))?)
    }

    fn query_count(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row(sql, params_from_iter(params.iter().copied()), |row| {
                row.get(0)
            })?;
        usize::try_from(count)
            .map_err(|_| DbError::ExecutionError(format!("count out of range: {count}")))
    }

    fn query_rows(
        &self,
        sql: &str,
        params: &[&str],
        columns: usize,
    ) -> DbResult<Vec<Vec<Option<String>>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter().copied()), |row| {
            (0..columns)
                .map(|i| row.get::<_, Option<String>>(i))
                .collect::<Result<Vec<_>, _>>()
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn begin(&self) -> DbResult<()> {
        // IMMEDIATE takes the write lock up front so a competing writer waits
        // on busy_timeout here instead of failing mid-migration.
        Ok(self.conn.execute_batch("BEGIN IMMEDIATE")?)
    }

    fn commit(&self) -> DbResult<()> {
        Ok(self.conn.execute_batch("COMMIT")?)
    }

    fn rollback(&self) -> DbResult<()> {
        Ok(self.conn.execute_batch("ROLLBACK")?)
    }

    fn list_relations(&self) -> DbResult<Vec<Relation>> {
        let rows = self.query_rows(
            "SELECT name, type FROM sqlite_master
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
             ORDER BY name",
            &[],
            2,
        )?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let mut cols = row.into_iter();
                let name = cols.next().flatten()?;
                let kind = match cols.next().flatten().as_deref() {
                    Some("view") => RelationKind::View,
                    _ => RelationKind::Table,
                };
                Some(Relation { name, kind })
            })
            .collect())
    }

    fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let count = self.query_count(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            &[name],
        )?;
        Ok(count > 0)
    }

    fn foreign_key_checks(&self) -> DbResult<bool> {
        let enabled: i64 = self
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        Ok(enabled != 0)
    }

    fn set_foreign_key_checks(&self, enabled: bool) -> DbResult<()> {
        self.execute_batch(if enabled {
            "PRAGMA foreign_keys = ON"
        } else {
            "PRAGMA foreign_keys = OFF"
        })
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
