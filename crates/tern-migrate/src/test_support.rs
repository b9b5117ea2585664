//! Backend wrapper that injects failures into an in-memory SQLite database.

use std::cell::RefCell;
use tern_core::{DbType, SqliteSettings};
use tern_db::{DbError, DbResult, MigrationBackend, Relation, SqliteBackend};

/// Delegates to SQLite, except where a fault is configured.
pub(crate) struct FaultyBackend {
    inner: SqliteBackend,
    /// `drop_relation` fails for this name
    undroppable: Option<String>,
    /// Executed once, outside any transaction, right before the next `BEGIN`.
    /// Stands in for another process writing between two of our calls.
    before_begin: RefCell<Option<String>>,
}

impl FaultyBackend {
    pub(crate) fn new() -> Self {
        Self {
            inner: SqliteBackend::in_memory(SqliteSettings::default()).unwrap(),
            undroppable: None,
            before_begin: RefCell::new(None),
        }
    }

    pub(crate) fn with_undroppable(mut self, name: &str) -> Self {
        self.undroppable = Some(name.to_string());
        self
    }

    pub(crate) fn with_write_before_begin(self, sql: &str) -> Self {
        *self.before_begin.borrow_mut() = Some(sql.to_string());
        self
    }
}

impl MigrationBackend for FaultyBackend {
    fn db_type(&self) -> DbType {
        self.inner.db_type()
    }

    fn configure(&self) -> DbResult<()> {
        self.inner.configure()
    }

    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.inner.execute_batch(sql)
    }

    fn execute_with_params(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        self.inner.execute_with_params(sql, params)
    }

    fn query_count(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        self.inner.query_count(sql, params)
    }

    fn query_rows(
        &self,
        sql: &str,
        params: &[&str],
        columns: usize,
    ) -> DbResult<Vec<Vec<Option<String>>>> {
        self.inner.query_rows(sql, params, columns)
    }

    fn begin(&self) -> DbResult<()> {
        if let Some(sql) = self.before_begin.borrow_mut().take() {
            self.inner.execute_batch(&sql)?;
        }
        self.inner.begin()
    }

    fn commit(&self) -> DbResult<()> {
        self.inner.commit()
    }

    fn rollback(&self) -> DbResult<()> {
        self.inner.rollback()
    }

    fn list_relations(&self) -> DbResult<Vec<Relation>> {
        self.inner.list_relations()
    }

    fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.inner.relation_exists(name)
    }

    fn drop_relation(&self, relation: &Relation) -> DbResult<()> {
        if self.undroppable.as_deref() == Some(relation.name.as_str()) {
            return Err(DbError::ExecutionError(format!(
                "cannot drop {}: object is locked",
                relation.name
            )));
        }
        self.inner.drop_relation(relation)
    }

    fn foreign_key_checks(&self) -> DbResult<bool> {
        self.inner.foreign_key_checks()
    }

    fn set_foreign_key_checks(&self, enabled: bool) -> DbResult<()> {
        self.inner.set_foreign_key_checks(enabled)
    }
}
