//! Key-value storage the tracker persists into.
//!
//! Values are JSON strings, one per key, the same shape browser local storage
//! holds. The trait is synchronous; implementations that touch disk are
//! expected to be driven from a blocking context.

use std::collections::BTreeMap;

/// Errors from a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be encoded or decoded.
    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A string-to-string store with local-storage semantics.
pub trait KeyValueStore {
    /// Value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Insert or replace `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to persist the change.
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to persist the change.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// All keys currently stored, sorted.
    fn keys(&self) -> Vec<String>;
}

/// In-memory store, used in tests and as the snapshot inside file-backed stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Build a store from existing entries.
    #[must_use]
    pub const fn from_entries(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// Borrow the raw entries.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
