//! tern-migrate - Migration runner for Tern
//!
//! Applies forward-only SQL migration scripts in filename order. Each script
//! runs in its own transaction together with its bookkeeping insert, so a
//! migration is either fully applied and recorded or not at all. A run halts
//! at the first failing migration.

pub mod applier;
pub mod error;
pub mod report;
pub mod reset;
pub mod runner;
pub mod versioning;

#[cfg(test)]
mod test_support;

pub use applier::apply_migration;
pub use error::{ApplyCause, MigrateError, MigrateResult};
pub use report::{
    MigrationFailure, MigrationState, MigrationStatus, RunPhase, RunReport, RunStatus,
    StatusReport,
};
pub use reset::{reset_all, ResetSummary};
pub use runner::{open_database, RunOptions, Runner};
pub use versioning::{AppliedRecord, VersioningStore};
