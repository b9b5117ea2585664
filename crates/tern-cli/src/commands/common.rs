//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::path::Path;
use tern_core::Config;
use tern_db::MigrationBackend;
use tern_migrate::{open_database, Runner};

use crate::cli::GlobalArgs;

/// Load the config file (if any) and apply command-line overrides.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    let project_dir = Path::new(&global.project_dir);
    let mut config = match &global.config {
        Some(path) => {
            Config::load(Path::new(path)).context("Failed to load configuration file")?
        }
        None => Config::load_from_dir(project_dir)
            .context("Failed to load project configuration")?,
    };

    if let Some(dir) = &global.migrations_dir {
        config.migrations_dir = dir.clone();
    }
    if let Some(path) = &global.database {
        config.database.path = Some(path.clone());
    }
    if let Some(backend) = global.backend {
        config.database.db_type = backend.into();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Build the runner and open the database.
///
/// The migrations directory is checked first so that a missing directory
/// fails before the database file is created.
pub(crate) fn prepare(global: &GlobalArgs) -> Result<(Runner, Box<dyn MigrationBackend>)> {
    let config = load_config(global)?;
    let runner = Runner::from_config(&config, Path::new(&global.project_dir));
    runner.check_migrations_dir()?;

    if config.database.path.is_none() {
        anyhow::bail!("No database given. Use --database or set DATABASE_PATH");
    }
    let db = open_database(&config.database)?;
    Ok((runner, db))
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
