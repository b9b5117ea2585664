//! Full reset: drop every user object (tables, views, and on DuckDB also
//! sequences, macros, types and extra schemas) except the bookkeeping table,
//! then clear the bookkeeping table.
//!
//! Destructive and irreversible. Only reached through an explicit opt-in
//! (`RunOptions::reset`); a normal run never calls it.
//!
//! The drops are not wrapped in a transaction. If one fails, relations
//! dropped before it stay dropped and the bookkeeping table is left
//! untouched.

use crate::error::{MigrateError, MigrateResult};
use crate::versioning::VersioningStore;
use tern_db::{DbError, MigrationBackend, Relation, RelationKind};

/// Outcome of a successful reset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetSummary {
    /// Relations dropped, in drop order
    pub dropped: Vec<Relation>,
    /// Bookkeeping rows deleted
    pub cleared_records: usize,
}

/// Drop every listed object except the bookkeeping table and clear its rows.
pub fn reset_all(
    db: &dyn MigrationBackend,
    store: &VersioningStore<'_>,
) -> MigrateResult<ResetSummary> {
    let keep = store.table();
    let reset_err = |target: &str, source: DbError| MigrateError::Reset {
        target: target.to_string(),
        source,
    };

    let mut pending: Vec<Relation> = db
        .list_relations()
        .map_err(|e| reset_err("schema", e))?
        .into_iter()
        .filter(|r| !(r.kind == RelationKind::Table && r.name.eq_ignore_ascii_case(keep)))
        .collect();
    pending.sort_by_key(|r| drop_rank(r.kind));

    let fk_enabled = db
        .foreign_key_checks()
        .map_err(|e| reset_err("foreign_keys", e))?;
    if fk_enabled {
        db.set_foreign_key_checks(false)
            .map_err(|e| reset_err("foreign_keys", e))?;
    }

    let dropped = drop_in_passes(db, pending);

    if fk_enabled {
        if let Err(e) = db.set_foreign_key_checks(true) {
            if dropped.is_ok() {
                return Err(reset_err("foreign_keys", e));
            }
            log::warn!("Failed to re-enable foreign keys: {e}");
        }
    }
    let dropped = dropped?;

    let cleared_records = store.clear_all().map_err(|e| reset_err(keep, e))?;
    log::info!(
        "Reset dropped {} relation(s) and cleared {} record(s)",
        dropped.len(),
        cleared_records
    );
    Ok(ResetSummary {
        dropped,
        cleared_records,
    })
}

/// Position in the first drop pass. Dependents go before what they use:
/// views and macros before tables, tables before the sequences and types
/// their columns reference.
fn drop_rank(kind: RelationKind) -> u8 {
    match kind {
        RelationKind::View => 0,
        RelationKind::Macro | RelationKind::TableMacro => 1,
        RelationKind::Table => 2,
        RelationKind::Schema => 3,
        RelationKind::Sequence => 4,
        RelationKind::Type => 5,
    }
}

/// Drop `pending`, retrying failures in later passes so that dependents
/// that block a drop get removed first. Stops when a whole pass makes no
/// progress.
fn drop_in_passes(
    db: &dyn MigrationBackend,
    mut pending: Vec<Relation>,
) -> MigrateResult<Vec<Relation>> {
    let mut dropped = Vec::with_capacity(pending.len());
    let mut pass = 1;

    while !pending.is_empty() {
        let attempted = pending.len();
        let mut failed = Vec::new();
        let mut last_error = None;

        for relation in pending {
            match db.drop_relation(&relation) {
                Ok(()) => {
                    log::debug!("Dropped {:?} {}", relation.kind, relation.name);
                    dropped.push(relation);
                }
                Err(e) => {
                    log::warn!("Pass {pass}: could not drop {}: {e}", relation.name);
                    last_error = Some(e);
                    failed.push(relation);
                }
            }
        }

        if let Some(error) = last_error {
            if failed.len() == attempted {
                let target = failed.last().map(|r| r.name.clone()).unwrap_or_default();
                return Err(MigrateError::Reset {
                    target,
                    source: error,
                });
            }
        }
        pending = failed;
        pass += 1;
    }
    Ok(dropped)
}

#[cfg(test)]
#[path = "reset_test.rs"]
mod tests;
