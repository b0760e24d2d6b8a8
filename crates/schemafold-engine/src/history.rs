//! Migration history on disk
//!
//! A history directory holds one `<name>.json` file per migration. Names carry
//! a numeric prefix (`0001_...`), so lexical order is application order.

use schemafold_core::{MigrationFormatError, OperationalMigration};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid migration file {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: MigrationFormatError,
    },

    #[error("Failed to serialize migration '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Load every `*.json` migration in `dir`, ordered by migration name.
///
/// Other files are ignored. A missing directory is an error.
pub fn load_migrations(dir: &Path) -> Result<Vec<OperationalMigration>, LoadError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| LoadError::Io { path, source }
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err(dir))? {
        let path = entry.map_err(io_err(dir))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }

    let mut migrations = Vec::with_capacity(files.len());
    for path in files {
        let content = std::fs::read_to_string(&path).map_err(io_err(&path))?;
        let migration = OperationalMigration::from_json(&content)
            .map_err(|source| LoadError::Format { path: path.clone(), source })?;
        debug!(
            migration = %migration.name,
            operations = migration.operations.len(),
            "Loaded migration from {}",
            path.display()
        );
        migrations.push(migration);
    }

    migrations.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(migrations)
}

/// Write `migration` to `<dir>/<name>.json`, creating `dir` if needed.
///
/// Returns the path written. An existing file with the same name is replaced.
pub fn write_migration(dir: &Path, migration: &OperationalMigration) -> Result<PathBuf, LoadError> {
    std::fs::create_dir_all(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let json = migration
        .to_json_pretty()
        .map_err(|source| LoadError::Serialize {
            name: migration.name.clone(),
            source,
        })?;

    let path = dir.join(format!("{}.json", migration.name));
    std::fs::write(&path, json + "\n").map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;

    debug!(migration = %migration.name, "Wrote migration to {}", path.display());
    Ok(path)
}
