//! Run and status reports returned to the caller.

use crate::error::MigrateError;
use crate::versioning::AppliedRecord;
use chrono::{DateTime, Utc};
use std::fmt;
use tern_core::MigrationName;

/// Final state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every discovered migration is applied
    Done,
    /// A migration failed and the run halted
    Failed,
}

/// Runner state machine position, logged at each transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Initializing,
    Resetting,
    Discovering,
    /// 1-based index of the migration being applied
    Applying(usize),
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Initializing => write!(f, "initializing"),
            RunPhase::Resetting => write!(f, "resetting"),
            RunPhase::Discovering => write!(f, "discovering"),
            RunPhase::Applying(n) => write!(f, "applying({n})"),
            RunPhase::Done => write!(f, "done"),
            RunPhase::Failed => write!(f, "failed"),
        }
    }
}

/// The migration that halted a run and why
#[derive(Debug)]
pub struct MigrationFailure {
    pub name: MigrationName,
    pub error: MigrateError,
}

/// Outcome of [`Runner::run`](crate::Runner::run).
#[derive(Debug)]
pub struct RunReport {
    pub status: RunStatus,
    /// Migrations applied by this run, in apply order
    pub applied: Vec<MigrationName>,
    /// Migrations already recorded before this run
    pub skipped: Vec<MigrationName>,
    /// Migrations after the failed one, never looked at
    pub not_attempted: Vec<MigrationName>,
    pub failure: Option<MigrationFailure>,
    pub reset_performed: bool,
}

impl RunReport {
    pub(crate) fn new(reset_performed: bool) -> Self {
        Self {
            status: RunStatus::Done,
            applied: Vec::new(),
            skipped: Vec::new(),
            not_attempted: Vec::new(),
            failure: None,
            reset_performed,
        }
    }

    /// Number of migrations applied by this run
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Number of migrations skipped as already applied
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// True when the run reached `Done`
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Done
    }
}

/// Applied state of one discovered migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    Applied { applied_at: DateTime<Utc> },
    Pending,
}

/// A discovered migration and its applied state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationState {
    pub name: MigrationName,
    pub status: MigrationStatus,
}

/// Outcome of [`Runner::status`](crate::Runner::status)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Discovered migrations in apply order
    pub migrations: Vec<MigrationState>,
    /// Recorded filenames with no script on disk
    pub orphaned: Vec<AppliedRecord>,
}

impl StatusReport {
    /// Number of discovered migrations not yet applied
    pub fn pending_count(&self) -> usize {
        self.migrations
            .iter()
            .filter(|m| m.status == MigrationStatus::Pending)
            .count()
    }
}
