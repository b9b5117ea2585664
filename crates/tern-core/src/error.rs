//! Error types for tern-core

use thiserror::Error;

/// Core error type for Tern
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Migrations directory not found
    #[error("[E003] Migrations directory not found: {path}")]
    DirectoryNotFound { path: String },

    /// E004: Migrations path exists but is not a directory
    #[error("[E004] Migrations path is not a directory: {path}")]
    NotADirectory { path: String },

    /// E005: Migration filename cannot be used as an identity
    #[error("[E005] Invalid migration filename '{name}': {reason}")]
    InvalidMigrationName { name: String, reason: String },

    /// E006: Script could not be tokenized into statements
    #[error("[E006] Failed to split statements in {name}: {message}")]
    StatementSplit { name: String, message: String },

    /// E007: IO error
    #[error("[E007] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E008: IO error with file path context
    #[error("[E008] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E009: YAML parse error
    #[error("[E009] Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
