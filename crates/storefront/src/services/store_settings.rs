//! Store settings edited from the admin panel.
//!
//! The `KEY=value` settings file is read on every call, so changes made in
//! the admin panel apply without restarting the storefront.

use std::collections::BTreeMap;
use std::path::Path;

use frenos_core::EnvFile;

/// Read the settings file. A missing file reads as empty.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub async fn read(path: &Path) -> std::io::Result<EnvFile> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(EnvFile::parse(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EnvFile::default()),
        Err(e) => Err(e),
    }
}

/// Values for `keys`, settings file first and process environment second.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub async fn merged(path: &Path, keys: &[&str]) -> std::io::Result<BTreeMap<String, String>> {
    Ok(read(path).await?.merged_over_env(keys))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = read(&dir.path().join(".env.local")).await.unwrap();
        assert_eq!(file, EnvFile::default());
    }

    #[tokio::test]
    async fn test_file_changes_are_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.local");
        let key = "FRENOS_TEST_STORE_SETTING";

        std::fs::write(&path, format!("{key}=uno\n")).unwrap();
        assert_eq!(merged(&path, &[key]).await.unwrap()[key], "uno");

        std::fs::write(&path, format!("{key}=dos\n")).unwrap();
        assert_eq!(merged(&path, &[key]).await.unwrap()[key], "dos");
    }
}
