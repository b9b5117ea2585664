//! Status command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use tern_migrate::{MigrationStatus, StatusReport};

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::prepare;

/// One migration as shown by `tern status`
#[derive(Debug, Serialize)]
pub(crate) struct MigrationInfo {
    name: String,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied_at: Option<String>,
}

/// Serialized form of the whole status output
#[derive(Debug, Serialize)]
pub(crate) struct StatusInfo {
    migrations: Vec<MigrationInfo>,
    orphaned: Vec<MigrationInfo>,
    pending: usize,
}

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let (runner, db) = prepare(global)?;
    let report = runner.status(db.as_ref())?;
    let info = build_info(&report);

    match args.output {
        StatusOutput::Table => print!("{}", format_table(&info)),
        StatusOutput::Json => {
            let json =
                serde_json::to_string_pretty(&info).context("Failed to serialize to JSON")?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn format_time(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub(crate) fn build_info(report: &StatusReport) -> StatusInfo {
    let migrations = report
        .migrations
        .iter()
        .map(|m| match &m.status {
            MigrationStatus::Applied { applied_at } => MigrationInfo {
                name: m.name.to_string(),
                state: "applied",
                applied_at: Some(format_time(applied_at)),
            },
            MigrationStatus::Pending => MigrationInfo {
                name: m.name.to_string(),
                state: "pending",
                applied_at: None,
            },
        })
        .collect();

    let orphaned = report
        .orphaned
        .iter()
        .map(|r| MigrationInfo {
            name: r.name.to_string(),
            state: "orphaned",
            applied_at: Some(format_time(&r.applied_at)),
        })
        .collect();

    StatusInfo {
        migrations,
        orphaned,
        pending: report.pending_count(),
    }
}

pub(crate) fn format_table(info: &StatusInfo) -> String {
    let rows: Vec<&MigrationInfo> = info.migrations.iter().chain(&info.orphaned).collect();
    if rows.is_empty() {
        return "No migrations found.\n".to_string();
    }

    let name_width = rows
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0)
        .max("MIGRATION".len());

    let mut out = format!("{:<name_width$}  {:<8}  APPLIED AT\n", "MIGRATION", "STATE");
    out.push_str(&format!("{}\n", "-".repeat(name_width + 2 + 8 + 2 + 23)));
    for row in rows {
        out.push_str(&format!(
            "{:<name_width$}  {:<8}  {}\n",
            row.name,
            row.state,
            row.applied_at.as_deref().unwrap_or("-")
        ));
    }
    out.push_str(&format!(
        "\n{} migration(s), {} pending\n",
        info.migrations.len(),
        info.pending
    ));
    out
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
