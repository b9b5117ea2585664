//! Configuration types and parsing for tern.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the bookkeeping table
pub const DEFAULT_BOOKKEEPING_TABLE: &str = "schema_migrations";

/// Config file names tried by [`Config::load_from_dir`], in order
const CONFIG_FILE_NAMES: &[&str] = &["tern.yml", "tern.yaml"];

/// Main configuration from tern.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory containing the migration scripts
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// File extension of migration scripts (without the leading dot)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Table recording which migrations have been applied
    #[serde(default = "default_bookkeeping_table")]
    pub bookkeeping_table: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            extension: default_extension(),
            bookkeeping_table: default_bookkeeping_table(),
            database: DatabaseConfig::default(),
        }
    }
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// DuckDB
    DuckDb,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::Sqlite => write!(f, "sqlite"),
            DbType::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type (sqlite or duckdb)
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database file path, or `:memory:`. Usually supplied by the caller.
    #[serde(default)]
    pub path: Option<String>,

    /// Create the database file when it does not exist yet
    #[serde(default = "default_true")]
    pub create_if_missing: bool,

    /// SQLite connection pragmas
    #[serde(default)]
    pub sqlite: SqliteSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: None,
            create_if_missing: true,
            sqlite: SqliteSettings::default(),
        }
    }
}

/// SQLite `journal_mode` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Write-ahead logging, lets readers proceed while the runner writes
    #[default]
    Wal,
    /// Rollback journal deleted at the end of each transaction
    Delete,
    /// Rollback journal truncated at the end of each transaction
    Truncate,
    /// Rollback journal held in memory
    Memory,
}

impl JournalMode {
    /// Returns the SQLite pragma value.
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Memory => "MEMORY",
        }
    }
}

/// SQLite `synchronous` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SynchronousMode {
    /// No syncs
    Off,
    /// Sync at critical moments; safe with WAL
    #[default]
    Normal,
    /// Sync on every commit
    Full,
    /// Full plus directory sync
    Extra,
}

impl SynchronousMode {
    /// Returns the SQLite pragma value.
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }
}

/// SQLite `temp_store` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TempStore {
    /// Compile-time default
    Default,
    /// Temporary tables on disk
    File,
    /// Temporary tables in memory
    #[default]
    Memory,
}

impl TempStore {
    /// Returns the SQLite pragma value.
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::File => "FILE",
            Self::Memory => "MEMORY",
        }
    }
}

/// Pragmas applied to every SQLite connection before migrating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteSettings {
    /// Journal mode
    #[serde(default)]
    pub journal_mode: JournalMode,

    /// Sync mode
    #[serde(default)]
    pub synchronous: SynchronousMode,

    /// Enforce foreign keys
    #[serde(default = "default_true")]
    pub foreign_keys: bool,

    /// Where temporary tables live
    #[serde(default)]
    pub temp_store: TempStore,

    /// Page cache size; negative values are KiB
    #[serde(default = "default_cache_size")]
    pub cache_size: i64,

    /// How long a locked database is retried before failing, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::default(),
            synchronous: SynchronousMode::default(),
            foreign_keys: true,
            temp_store: TempStore::default(),
            cache_size: default_cache_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_extension() -> String {
    "sql".to_string()
}

fn default_bookkeeping_table() -> String {
    DEFAULT_BOOKKEEPING_TABLE.to_string()
}

fn default_cache_size() -> i64 {
    -20000
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Whether `name` is a bare SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// Table names from configuration are interpolated into DDL, so anything
/// else is rejected up front.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory.
    ///
    /// Looks for tern.yml or tern.yaml and falls back to the defaults when
    /// neither exists.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for file_name in CONFIG_FILE_NAMES {
            let path = dir.join(file_name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        log::debug!("No config file in {}, using defaults", dir.display());
        Ok(Self::default())
    }

    /// Resolve the migrations directory against `base` when it is relative
    pub fn migrations_path(&self, base: &Path) -> PathBuf {
        let dir = Path::new(&self.migrations_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            base.join(dir)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.migrations_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_dir cannot be empty".to_string(),
            });
        }

        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "extension must be non-empty and given without a leading dot, got '{}'",
                    self.extension
                ),
            });
        }

        if !is_plain_identifier(&self.bookkeeping_table) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "bookkeeping_table '{}' must match [A-Za-z_][A-Za-z0-9_]*",
                    self.bookkeeping_table
                ),
            });
        }

        if self.database.sqlite.busy_timeout_ms > u64::from(u32::MAX) {
            return Err(CoreError::ConfigInvalid {
                message: "database.sqlite.busy_timeout_ms is too large".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
