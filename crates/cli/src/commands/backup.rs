//! Tracker backup export and import.
//!
//! # Usage
//!
//! ```bash
//! frenos backup export --store data/tracker/<id>.json --out respaldo.json
//! frenos backup import --store data/tracker/<id>.json --file respaldo.json
//! ```
//!
//! Stop the storefront before importing; the running server keeps its own
//! copy of the tracker file in memory.

use std::path::Path;

use frenos_core::tracker::StoreError;
use frenos_core::tracker::backup::{self, Backup, BackupError};
use frenos_storefront::services::tracker_store::FileStore;
use thiserror::Error;

/// Errors that can occur handling backups.
#[derive(Debug, Error)]
pub enum BackupCommandError {
    #[error("Tracker store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid backup file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backup rejected: {0}")]
    Backup(#[from] BackupError),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BackupCommandError + '_ {
    move |source| BackupCommandError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Write every tracker key in `store` to `out`. Returns the key count.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the output written.
pub fn export(store: &Path, out: &Path) -> Result<usize, BackupCommandError> {
    let store = FileStore::open(store)?;
    let snapshot = backup::export(&store);

    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(out, json).map_err(io_error(out))?;

    tracing::info!(keys = snapshot.data.len(), out = %out.display(), "Backup exported");
    Ok(snapshot.data.len())
}

/// Replace the tracker state in `store` with the backup in `file`.
/// Returns the key count.
///
/// # Errors
///
/// Returns an error if the backup is unreadable or rejected, or the store
/// cannot be written.
pub fn import(store: &Path, file: &Path) -> Result<usize, BackupCommandError> {
    let json = std::fs::read_to_string(file).map_err(io_error(file))?;
    let snapshot: Backup = serde_json::from_str(&json)?;

    let mut store = FileStore::open(store)?;
    let written = backup::import(&mut store, &snapshot)?;

    tracing::info!(keys = written, store = %store.path().display(), "Backup imported");
    Ok(written)
}
