//! DuckDB backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{MigrationBackend, Relation, RelationKind};
use duckdb::{params_from_iter, Connection};
use std::path::Path;
use tern_core::DbType;

/// DuckDB backend
pub struct DuckDbBackend {
    conn: Connection,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path, create_if_missing: bool) -> DbResult<Self> {
        if !create_if_missing && !path.exists() {
            return Err(DbError::ConnectionError(format!(
                "database file not found: {}",
                path.display()
            )));
        }
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self { conn })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str, create_if_missing: bool) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path), create_if_missing)
        }
    }

    /// Borrow the underlying DuckDB connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl MigrationBackend for DuckDbBackend {
    fn db_type(&self) -> DbType {
        DbType::DuckDb
    }

    fn configure(&self) -> DbResult<()> {
        // DuckDB serializes writers with its own file lock; there is no
        // journal or busy-timeout setting to apply.
        log::debug!("DuckDB connection needs no pragmas");
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
        Ok(self.conn.execute_batch("BEGIN TRANSACTION")?)
    }

    fn commit(&self) -> DbResult<()> {
        Ok(self.conn.execute_batch("COMMIT")?)
    }

    fn rollback(&self) -> DbResult<()> {
        Ok(self.conn.execute_batch("ROLLBACK")?)
    }

    fn list_relations(&self) -> DbResult<Vec<Relation>> {
        // Objects in other schemas go away with their schema's CASCADE drop.
        let rows = self.query_rows(
            "SELECT view_name, 'view' FROM duckdb_views()
             WHERE database_name = current_database() AND schema_name = 'main'
               AND NOT internal AND NOT temporary
             UNION ALL
             SELECT table_name, 'table' FROM duckdb_tables()
             WHERE database_name = current_database() AND schema_name = 'main'
               AND NOT internal AND NOT temporary
             UNION ALL
             SELECT sequence_name, 'sequence' FROM duckdb_sequences()
             WHERE database_name = current_database() AND schema_name = 'main'
               AND NOT temporary
             UNION ALL
             SELECT DISTINCT function_name, function_type FROM duckdb_functions()
             WHERE database_name = current_database() AND schema_name = 'main'
               AND NOT internal AND function_type IN ('macro', 'table_macro')
             UNION ALL
             SELECT type_name, 'type' FROM duckdb_types()
             WHERE database_name = current_database() AND schema_name = 'main'
               AND NOT internal
             UNION ALL
             SELECT schema_name, 'schema' FROM duckdb_schemas()
             WHERE database_name = current_database() AND schema_name <> 'main'
               AND NOT internal
             ORDER BY 1",
            &[],
            2,
        )?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let mut cols = row.into_iter();
                let name = cols.next().flatten()?;
                let kind = match cols.next().flatten()?.as_str() {
                    "view" => RelationKind::View,
                    "table" => RelationKind::Table,
                    "sequence" => RelationKind::Sequence,
                    "macro" => RelationKind::Macro,
                    "table_macro" => RelationKind::TableMacro,
                    "type" => RelationKind::Type,
                    "schema" => RelationKind::Schema,
                    other => {
                        log::warn!("Ignoring catalog entry {name} of unknown kind {other}");
                        return None;
                    }
                };
                Some(Relation { name, kind })
            })
            .collect())
    }

    fn relation_exists(&self, name: &str) -> DbResult<bool> {
        // Handle schema-qualified names
        let (schema, table) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("main", name),
        };
        let count = self.query_count(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            &[schema, table],
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
