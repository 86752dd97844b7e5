//! File-backed tracker storage.
//!
//! Each visitor's tracker data is private to their browser session: the
//! session carries a [`TrackerOwner`] id and the owner's key-value map lives
//! in its own JSON file, `<data dir>/<owner>.json`. Every change rewrites
//! the file through a temporary sibling and a rename, so a crash mid-write
//! leaves the previous version intact. Access goes through
//! [`TrackerHandle`], which serializes callers behind a mutex and runs the
//! blocking file I/O on Tokio's blocking pool.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use frenos_core::Tracker;
use frenos_core::tracker::{KeyValueStore, MemoryStore, StoreError};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// A [`KeyValueStore`] persisted to a JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: MemoryStore,
}

impl FileStore {
    /// Open `path`, starting empty when the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => {
                let map: BTreeMap<String, String> = serde_json::from_str(&text)?;
                debug!(path = %path.display(), keys = map.len(), "Loaded tracker data");
                MemoryStore::from_entries(map)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => MemoryStore::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, entries })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(self.entries.entries())?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply a change in memory, persist it, and roll back if persisting fails.
    fn apply(
        &mut self,
        key: &str,
        change: impl FnOnce(&mut MemoryStore) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let previous = self.entries.get(key);
        change(&mut self.entries)?;

        if let Err(e) = self.persist() {
            match previous {
                Some(value) => self.entries.set(key, value)?,
                None => self.entries.remove(key)?,
            }
            return Err(e);
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.apply(key, |entries| entries.set(key, value))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.get(key).is_none() {
            return Ok(());
        }
        self.apply(key, |entries| entries.remove(key))
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys()
    }
}

/// Errors running a tracker task.
#[derive(Debug, Error)]
pub enum TrackerTaskError {
    #[error("tracker lock poisoned")]
    Poisoned,

    #[error("failed to open tracker data: {0}")]
    Store(#[from] StoreError),

    #[error("tracker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The browser session a set of tracker data belongs to.
///
/// Ids are generated server-side and only ever travel inside the session,
/// so they are safe to use as file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackerOwner(Uuid);

impl TrackerOwner {
    /// A fresh owner id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for TrackerOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Shared, cloneable access to the per-owner tracker files.
#[derive(Clone)]
pub struct TrackerHandle {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl TrackerHandle {
    /// Tracker files live directly under `dir`, created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Data file for `owner`.
    #[must_use]
    pub fn data_path(&self, owner: TrackerOwner) -> PathBuf {
        self.dir.join(format!("{owner}.json"))
    }

    /// Run `f` against `owner`'s tracker on the blocking pool, with
    /// exclusive access to the data files.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner's file cannot be loaded, the lock is
    /// poisoned or the task panics.
    pub async fn run<T, F>(&self, owner: TrackerOwner, f: F) -> Result<T, TrackerTaskError>
    where
        F: FnOnce(&mut Tracker<FileStore>) -> T + Send + 'static,
        T: Send + 'static,
    {
        let lock = Arc::clone(&self.lock);
        let path = self.data_path(owner);
        tokio::task::spawn_blocking(move || {
            let _guard = lock.lock().map_err(|_| TrackerTaskError::Poisoned)?;
            let mut tracker = Tracker::new(FileStore::open(path)?);
            Ok(f(&mut tracker))
        })
        .await?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frenos_core::tracker::{VehicleInfo, keys};

    use super::*;

    fn vehicle() -> VehicleInfo {
        VehicleInfo {
            make: "Peugeot".to_string(),
            model: "208".to_string(),
            year: 2020,
            patente: "AD 456 FG".to_string(),
            owner_name: "Julia".to_string(),
            owner_phone: None,
            image_url: None,
        }
    }

    #[test]
    fn changes_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("tracker.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set(keys::VEHICLES, "[]".to_string()).unwrap();
        store.set("oilChangeApp_workshopInfo", "{}".to_string()).unwrap();
        store.remove("oilChangeApp_workshopInfo").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::VEHICLES).as_deref(), Some("[]"));
        assert!(reopened.get("oilChangeApp_workshopInfo").is_none());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Encoding(_))));
    }

    #[tokio::test]
    async fn handle_runs_tracker_operations() {
        let dir = tempfile::tempdir().unwrap();
        let handle = TrackerHandle::new(dir.path());
        let owner = TrackerOwner::generate();

        let added = handle
            .run(owner, |t| t.add_vehicle(vehicle()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(added.info.patente, "AD456FG");

        let reopened = Tracker::new(FileStore::open(handle.data_path(owner)).unwrap());
        assert_eq!(reopened.vehicles(), vec![added]);
    }

    #[tokio::test]
    async fn owners_do_not_share_data() {
        let dir = tempfile::tempdir().unwrap();
        let handle = TrackerHandle::new(dir.path());
        let (ana, beto) = (TrackerOwner::generate(), TrackerOwner::generate());

        handle
            .run(ana, |t| t.add_vehicle(vehicle()))
            .await
            .unwrap()
            .unwrap();

        assert!(handle.run(beto, |t| t.vehicles()).await.unwrap().is_empty());
        assert_eq!(handle.run(ana, |t| t.vehicles()).await.unwrap().len(), 1);
        assert_ne!(handle.data_path(ana), handle.data_path(beto));
    }
}
