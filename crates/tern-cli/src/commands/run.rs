//! Run command implementation

use anyhow::Result;
use std::time::Duration;
use tern_migrate::{RunOptions, RunReport};

use crate::cli::{GlobalArgs, RunArgs};
use crate::commands::common::prepare;

/// Execute the run command
pub(crate) fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let (runner, db) = prepare(global)?;

    let mut options = RunOptions {
        reset: args.reset,
        ..RunOptions::default()
    };
    if let Some(secs) = args.timeout {
        options = options.with_timeout(Duration::from_secs(secs));
    }
    if args.reset {
        log::warn!("Reset requested: dropping every table except the bookkeeping table");
    }

    let mut report = runner.run(db.as_ref(), options)?;
    print!("{}", format_report(&report));

    match report.failure.take() {
        Some(failure) => Err(failure.error.into()),
        None => Ok(()),
    }
}

/// Render a run report as printed to stdout
pub(crate) fn format_report(report: &RunReport) -> String {
    let mut out = String::new();
    if report.reset_performed {
        out.push_str("Reset: all managed tables dropped\n");
    }
    for name in &report.applied {
        out.push_str(&format!("+{name}\n"));
    }

    if let Some(failure) = &report.failure {
        out.push_str(&format!("!{}\n", failure.name));
        out.push_str(&format!(
            "\nFailed: {} applied, {} skipped, {} not attempted\n",
            report.applied_count(),
            report.skipped_count(),
            report.not_attempted.len()
        ));
    } else if report.applied.is_empty() {
        out.push_str(&format!(
            "Nothing to apply ({} already applied)\n",
            report.skipped_count()
        ));
    } else {
        out.push_str(&format!(
            "\nDone: {} applied, {} skipped\n",
            report.applied_count(),
            report.skipped_count()
        ));
    }
    out
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
