//! Tracker backup export and import.
//!
//! A backup is every tracker key with its raw JSON value:
//!
//! ```json
//! { "version": 1, "exportedAt": "2024-05-02T12:00:00Z",
//!   "data": { "oilChangeApp_vehicles": "[...]" } }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::keys;
use super::store::{KeyValueStore, StoreError};

/// Format version written by [`export`] and accepted by [`import`].
pub const BACKUP_VERSION: u32 = 1;

/// Errors importing a backup.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("unsupported backup version {0}")]
    UnsupportedVersion(u32),

    /// A key outside the tracker namespace.
    #[error("backup contains foreign key {0:?}")]
    ForeignKey(String),

    /// A value that is not valid JSON.
    #[error("backup value for {key:?} is not valid JSON")]
    InvalidValue { key: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An exported snapshot of the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub data: BTreeMap<String, String>,
}

/// Snapshot every tracker key in `store`.
#[must_use]
pub fn export<S: KeyValueStore>(store: &S) -> Backup {
    let data = store
        .keys()
        .into_iter()
        .filter(|k| keys::is_namespaced(k))
        .filter_map(|k| store.get(&k).map(|v| (k, v)))
        .collect();

    Backup {
        version: BACKUP_VERSION,
        exported_at: Utc::now(),
        data,
    }
}

/// Replace all tracker state in `store` with the backup's contents.
///
/// The backup is checked in full before anything is touched. Keys outside
/// the tracker namespace are left alone. Returns the number of keys written.
///
/// # Errors
///
/// Returns an error for an unknown version, a foreign key, a value that is
/// not JSON, or a storage failure.
pub fn import<S: KeyValueStore>(store: &mut S, backup: &Backup) -> Result<usize, BackupError> {
    if backup.version != BACKUP_VERSION {
        return Err(BackupError::UnsupportedVersion(backup.version));
    }
    for (key, value) in &backup.data {
        if !keys::is_namespaced(key) {
            return Err(BackupError::ForeignKey(key.clone()));
        }
        if serde_json::from_str::<serde_json::Value>(value).is_err() {
            return Err(BackupError::InvalidValue { key: key.clone() });
        }
    }

    for key in store.keys() {
        if keys::is_namespaced(&key) {
            store.remove(&key)?;
        }
    }
    for (key, value) in &backup.data {
        store.set(key, value.clone())?;
    }

    tracing::info!(keys = backup.data.len(), "Imported tracker backup");
    Ok(backup.data.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::tracker::{BrakeService, MemoryStore, Tracker, VehicleInfo};

    fn vehicle(patente: &str) -> VehicleInfo {
        VehicleInfo {
            make: "Fiat".to_owned(),
            model: "Cronos".to_owned(),
            year: 2021,
            patente: patente.to_owned(),
            owner_name: "Sofía".to_owned(),
            owner_phone: None,
            image_url: None,
        }
    }

    fn brake() -> BrakeService {
        BrakeService {
            date: NaiveDate::from_ymd_opt(2024, 8, 20).unwrap(),
            mileage: 18_000,
            front_pads: true,
            rear_pads: true,
            front_discs: false,
            rear_discs: false,
            rear_shoes: false,
            brake_fluid: false,
            notes: String::new(),
            technician: String::new(),
        }
    }

    #[test]
    fn reimporting_export_replaces_state() {
        let mut tracker = Tracker::new(MemoryStore::new());
        let original = tracker.add_vehicle(vehicle("AE100AA")).unwrap();
        tracker.add_record(&original.id, brake()).unwrap();
        tracker.store_mut().set("theme", "\"dark\"".to_owned()).unwrap();
        let backup = export(tracker.store());
        assert!(!backup.data.contains_key("theme"));

        // Diverge after the export.
        let extra = tracker.add_vehicle(vehicle("ZZ999ZZ")).unwrap();
        tracker.add_record(&extra.id, brake()).unwrap();
        tracker.add_technician("Pedro").unwrap();

        let written = import(tracker.store_mut(), &backup).unwrap();
        assert_eq!(written, backup.data.len());

        assert_eq!(tracker.vehicles(), vec![original.clone()]);
        assert_eq!(tracker.records::<BrakeService>(&original.id).unwrap().len(), 1);
        assert!(tracker.workshop_info().technicians.is_empty());
        assert!(
            tracker
                .store()
                .get(&keys::bucket(keys::BRAKE_SERVICES, &extra.id))
                .is_none()
        );
        assert_eq!(tracker.store().get("theme").as_deref(), Some("\"dark\""));
    }

    #[test]
    fn rejects_unknown_version_and_foreign_keys() {
        let mut store = MemoryStore::new();
        store.set(keys::VEHICLES, "[]".to_owned()).unwrap();

        let mut backup = export(&store);
        backup.version = 2;
        assert!(matches!(
            import(&mut store, &backup),
            Err(BackupError::UnsupportedVersion(2))
        ));

        let mut backup = export(&store);
        backup.data.insert("other".to_owned(), "1".to_owned());
        assert!(matches!(
            import(&mut store, &backup),
            Err(BackupError::ForeignKey(_))
        ));
        // nothing was removed by the failed imports
        assert_eq!(store.get(keys::VEHICLES).as_deref(), Some("[]"));
    }

    #[test]
    fn rejects_values_that_are_not_json() {
        let mut store = MemoryStore::new();
        let mut backup = export(&store);
        backup
            .data
            .insert(keys::WORKSHOP_INFO.to_owned(), "{oops".to_owned());
        assert!(matches!(
            import(&mut store, &backup),
            Err(BackupError::InvalidValue { .. })
        ));
    }

    #[test]
    fn backup_json_uses_camel_case() {
        let store = MemoryStore::new();
        let json = serde_json::to_value(export(&store)).unwrap();
        assert_eq!(json["version"], 1);
        assert!(json.get("exportedAt").is_some());
        assert!(json["data"].as_object().unwrap().is_empty());
    }
}
