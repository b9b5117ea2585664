//! Backend trait definition

use crate::error::{DbError, DbResult};
use tern_core::DbType;

/// Kind of a user object in the live schema.
///
/// SQLite only has tables and views; the remaining kinds are DuckDB catalog
/// entries that a migration can create and a reset has to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Base table
    Table,
    /// View
    View,
    /// Sequence
    Sequence,
    /// Scalar macro
    Macro,
    /// Table macro
    TableMacro,
    /// User-defined type (e.g. an ENUM)
    Type,
    /// Schema other than `main`, dropped together with its contents
    Schema,
}

impl RelationKind {
    /// `DROP` statement removing an object of this kind named `name`
    pub fn drop_sql(self, name: &str) -> String {
        let name = quote_ident(name);
        match self {
            RelationKind::Table => format!("DROP TABLE IF EXISTS {name}"),
            RelationKind::View => format!("DROP VIEW IF EXISTS {name}"),
            RelationKind::Sequence => format!("DROP SEQUENCE IF EXISTS {name}"),
            RelationKind::Macro => format!("DROP MACRO IF EXISTS {name}"),
            RelationKind::TableMacro => format!("DROP MACRO TABLE IF EXISTS {name}"),
            RelationKind::Type => format!("DROP TYPE IF EXISTS {name}"),
            RelationKind::Schema => format!("DROP SCHEMA IF EXISTS {name} CASCADE"),
        }
    }
}

/// A table, view, or other droppable object found in the live schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Unqualified relation name
    pub name: String,
    /// What kind of object it is
    pub kind: RelationKind,
}

/// Connection abstraction the migration runner works against.
///
/// Calls are synchronous and blocking; a backend owns exactly one
/// connection and is driven from a single thread.
pub trait MigrationBackend: Send {
    /// Database type, also selects the tokenizer dialect for scripts
    fn db_type(&self) -> DbType;

    /// Apply connection-level settings (pragmas, busy timeout). Idempotent.
    fn configure(&self) -> DbResult<()>;

    /// Execute one or more statements, discarding any result rows
    fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a single statement with positional text parameters,
    /// returning the number of affected rows
    fn execute_with_params(&self, sql: &str, params: &[&str]) -> DbResult<usize>;

    /// Run a `SELECT COUNT(*)`-style query and return the first column of the first row
    fn query_count(&self, sql: &str, params: &[&str]) -> DbResult<usize>;

    /// Run a query returning `columns` text columns per row (NULL as `None`)
    fn query_rows(
        &self,
        sql: &str,
        params: &[&str],
        columns: usize,
    ) -> DbResult<Vec<Vec<Option<String>>>>;

    /// Start a transaction
    fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    fn rollback(&self) -> DbResult<()>;

    /// List user objects a reset must drop, excluding engine-internal ones
    fn list_relations(&self) -> DbResult<Vec<Relation>>;

    /// Check if a table or view exists
    fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Drop an object listed by [`list_relations`](Self::list_relations) if it exists
    fn drop_relation(&self, relation: &Relation) -> DbResult<()> {
        self.execute_batch(&relation.kind.drop_sql(&relation.name))
    }

    /// Whether foreign keys are currently enforced on this connection
    fn foreign_key_checks(&self) -> DbResult<bool> {
        Ok(false)
    }

    /// Turn foreign key enforcement on or off for this connection.
    ///
    /// Backends without a per-connection switch ignore the call.
    fn set_foreign_key_checks(&self, _enabled: bool) -> DbResult<()> {
        Ok(())
    }
}

/// Quote an identifier with double quotes, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
/// error.
///
/// A failed `COMMIT` is also rolled back, so either every statement issued
/// by `body` persists or none does.
pub fn with_transaction<T, E, F>(db: &dyn MigrationBackend, body: F) -> Result<T, E>
where
    F: FnOnce(&dyn MigrationBackend) -> Result<T, E>,
    E: From<DbError>,
{
    db.begin()
        .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

    let result = body(db);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = db.commit() {
                rollback_quietly(db);
                return Err(DbError::TransactionError(format!("COMMIT failed: {commit_err}")).into());
            }
        }
        Err(_) => rollback_quietly(db),
    }
    result
}

fn rollback_quietly(db: &dyn MigrationBackend) {
    if let Err(e) = db.rollback() {
        log::warn!("ROLLBACK failed: {e}");
    }
}
