//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use tern_core::DbType;

/// Tern - apply forward-only SQL migrations in filename order
#[derive(Parser, Debug)]
#[command(name = "tern")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the database file, or :memory:
    #[arg(short, long, global = true, env = "DATABASE_PATH")]
    pub database: Option<String>,

    /// Directory containing migration scripts
    #[arg(short, long, global = true)]
    pub migrations_dir: Option<String>,

    /// Path to project directory (config lookup and relative paths)
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Database engine
    #[arg(short, long, global = true, value_enum)]
    pub backend: Option<Backend>,
}

/// Supported database engines
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// SQLite
    Sqlite,
    /// DuckDB
    Duckdb,
}

impl From<Backend> for DbType {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Sqlite => DbType::Sqlite,
            Backend::Duckdb => DbType::DuckDb,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply every migration not yet recorded
    Run(RunArgs),

    /// Show applied and pending migrations
    Status(StatusArgs),
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Drop all tables except the bookkeeping table and reapply everything
    #[arg(long, alias = "rebuild")]
    pub reset: bool,

    /// Stop starting new work after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
