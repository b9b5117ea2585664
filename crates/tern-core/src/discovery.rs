//! Migration script discovery
//!
//! Lists the scripts of one directory (non-recursively) and orders them by
//! byte-wise filename comparison. That order is the only ordering authority
//! for a run; no dependency analysis is attempted.

use crate::error::{CoreError, CoreResult};
use crate::migration_name::MigrationName;
use std::path::{Path, PathBuf};

/// A migration script found on disk.
///
/// Content is not read during discovery; call [`read_sql`](Self::read_sql)
/// when the migration is about to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Filename, the identity of the migration
    pub name: MigrationName,

    /// Full path to the script
    pub path: PathBuf,
}

impl MigrationFile {
    /// Read the full SQL text of the script
    pub fn read_sql(&self) -> CoreResult<String> {
        std::fs::read_to_string(&self.path).map_err(|e| CoreError::IoWithPath {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}

/// Check that `dir` exists and is a directory.
///
/// Runs before any database work so that a missing directory aborts a run
/// without touching the database.
pub fn ensure_migrations_dir(dir: &Path) -> CoreResult<()> {
    if !dir.exists() {
        return Err(CoreError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }
    if !dir.is_dir() {
        return Err(CoreError::NotADirectory {
            path: dir.display().to_string(),
        });
    }
    Ok(())
}

/// List migration scripts in `dir` with the given extension, sorted by name.
///
/// Subdirectories, hidden files (leading `.`), and files whose names are not
/// valid UTF-8 are skipped. The extension comparison is case-sensitive. An
/// empty directory yields an empty list.
pub fn discover_migrations(dir: &Path, extension: &str) -> CoreResult<Vec<MigrationFile>> {
    ensure_migrations_dir(dir)?;

    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            log::warn!("Skipping migration with non UTF-8 name: {}", path.display());
            continue;
        };
        if file_name.starts_with('.') {
            continue;
        }

        let name =
            MigrationName::try_new(file_name).ok_or_else(|| CoreError::InvalidMigrationName {
                name: file_name.to_string(),
                reason: "not a bare filename".to_string(),
            })?;
        files.push(MigrationFile { name, path });
    }

    files.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    log::debug!(
        "Discovered {} migration(s) in {}",
        files.len(),
        dir.display()
    );
    Ok(files)
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
