//! Read and edit the `KEY=value` settings file.
//!
//! # Usage
//!
//! ```bash
//! frenos settings get WHATSAPP_NUMBER
//! frenos settings set STORE_NAME "Frenos Centro" --file .env.local
//! ```
//!
//! `get` falls back to the process environment when the file has no value,
//! the same way the servers resolve settings.

use std::path::Path;

use frenos_core::{EnvFile, EnvFileError};

/// Value of `key`: from the file, else the environment.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn get(file: &Path, key: &str) -> Result<Option<String>, EnvFileError> {
    dotenvy::dotenv().ok();

    let mut values = EnvFile::read(file)?.merged_over_env(&[key]);
    Ok(values.remove(key))
}

/// Set `key` in the file. An empty value removes the key.
///
/// # Errors
///
/// Returns an error for an invalid key or if the file cannot be written.
pub fn set(file: &Path, key: &str, value: &str) -> Result<(), EnvFileError> {
    let mut env_file = EnvFile::read(file)?;

    if value.trim().is_empty() {
        env_file.remove(key);
    } else {
        env_file.set(key, value)?;
    }
    env_file.write(file)?;

    tracing::info!(key, file = %file.display(), "Setting written");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".env.local");

        set(&file, "FRENOS_CLI_TEST_NAME", "Frenos Centro").unwrap();
        assert_eq!(
            get(&file, "FRENOS_CLI_TEST_NAME").unwrap().as_deref(),
            Some("Frenos Centro")
        );

        set(&file, "FRENOS_CLI_TEST_NAME", "").unwrap();
        assert_eq!(get(&file, "FRENOS_CLI_TEST_NAME").unwrap(), None);
    }

    #[test]
    fn test_invalid_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = set(&dir.path().join(".env.local"), "bad key", "x").unwrap_err();
        assert!(matches!(err, EnvFileError::InvalidKey(_)));
    }
}
