//! Settings file access from async handlers.
//!
//! [`EnvFile`] does plain blocking file I/O; these wrappers move it onto
//! Tokio's blocking pool.

use std::path::Path;

use frenos_core::{EnvFile, EnvFileError};

fn join_error(e: tokio::task::JoinError) -> EnvFileError {
    EnvFileError::Io(std::io::Error::other(e))
}

/// Read the settings file. A missing file reads as empty.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub async fn read(path: &Path) -> Result<EnvFile, EnvFileError> {
    let path = path.to_owned();
    tokio::task::spawn_blocking(move || EnvFile::read(&path))
        .await
        .map_err(join_error)?
}

/// Replace the settings file with `file`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn write(path: &Path, file: EnvFile) -> Result<(), EnvFileError> {
    let path = path.to_owned();
    tokio::task::spawn_blocking(move || file.write(&path))
        .await
        .map_err(join_error)?
}
