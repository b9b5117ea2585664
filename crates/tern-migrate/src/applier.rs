//! Applies one migration inside a single transaction.

use crate::error::{ApplyCause, MigrateError, MigrateResult};
use crate::versioning::VersioningStore;
use chrono::Utc;
use std::time::Instant;
use tern_core::{split_statements, MigrationFile};
use tern_db::{with_transaction, DbError, MigrationBackend};

/// Whether `deadline` has passed
pub(crate) fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Apply `file` and record it in `store`, all in one transaction.
///
/// The script is read and split before the transaction starts, so an
/// unreadable or untokenizable script executes nothing. Any failure after
/// `BEGIN` rolls back every statement of the file together with the
/// bookkeeping insert.
pub fn apply_migration(
    db: &dyn MigrationBackend,
    store: &VersioningStore<'_>,
    file: &MigrationFile,
    deadline: Option<Instant>,
) -> MigrateResult<()> {
    let fail = |cause: ApplyCause| MigrateError::Apply {
        name: file.name.clone(),
        cause,
    };

    if deadline_passed(deadline) {
        return Err(fail(ApplyCause::DeadlineExceeded));
    }

    let sql = file.read_sql().map_err(|e| fail(ApplyCause::Read(e)))?;
    let statements =
        split_statements(&file.name, &sql, db.db_type()).map_err(|e| fail(ApplyCause::Split(e)))?;
    log::debug!("{}: {} statement(s)", file.name, statements.len());

    let result = with_transaction(db, |db| -> Result<(), ApplyCause> {
        for stmt in &statements {
            if deadline_passed(deadline) {
                return Err(ApplyCause::DeadlineExceeded);
            }
            log::debug!("{} [{}]: {}", file.name, stmt.index, stmt.sql);
            db.execute_batch(&stmt.sql)
                .map_err(|source| ApplyCause::Statement {
                    index: stmt.index,
                    statement: stmt.sql.clone(),
                    source,
                })?;
        }

        store
            .record_applied(&file.name, Utc::now())
            .map_err(ApplyCause::Record)?;

        if deadline_passed(deadline) {
            return Err(ApplyCause::DeadlineExceeded);
        }
        Ok(())
    });

    match result {
        Ok(()) => {
            log::info!("+{}", file.name);
            Ok(())
        }
        Err(ApplyCause::Record(DbError::ConstraintViolation(msg))) => {
            log::error!("{} was recorded concurrently: {msg}", file.name);
            Err(MigrateError::DuplicateRecord {
                name: file.name.clone(),
            })
        }
        Err(cause) => {
            log::error!("{} rolled back: {cause}", file.name);
            Err(fail(cause))
        }
    }
}

#[cfg(test)]
#[path = "applier_test.rs"]
mod tests;
