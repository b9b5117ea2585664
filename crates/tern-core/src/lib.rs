//! tern-core - Core library for Tern
//!
//! This crate provides the project configuration, the strongly-typed
//! migration name, migration script discovery, and the tokenizer-based
//! statement splitter shared by the database and runner crates.

pub mod config;
pub mod discovery;
pub mod error;
pub mod migration_name;
pub mod statement;

pub use config::{is_plain_identifier, Config, DatabaseConfig, DbType, SqliteSettings};
pub use discovery::{discover_migrations, ensure_migrations_dir, MigrationFile};
pub use error::{CoreError, CoreResult};
pub use migration_name::MigrationName;
pub use statement::{split_statements, Statement};
