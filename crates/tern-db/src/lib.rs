//! tern-db - Database abstraction layer for Tern
//!
//! This crate provides the `MigrationBackend` trait used by the runner and
//! its implementations for SQLite and DuckDB.

pub mod connect;
pub mod duckdb;
pub mod error;
pub mod sqlite;
pub mod traits;

pub use connect::open_backend;
pub use crate::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use sqlite::SqliteBackend;
pub use traits::{quote_ident, with_transaction, MigrationBackend, Relation, RelationKind};
