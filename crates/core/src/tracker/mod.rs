//! Vehicle service tracker.
//!
//! Vehicles and their service history (oil changes, brake work, general
//! mechanics) plus the workshop's own details, persisted as JSON values in a
//! [`KeyValueStore`] under the layout in [`keys`].
//!
//! Reads never fail: a missing or corrupt value is logged and treated as
//! empty. Writes surface storage errors.

pub mod backup;
pub mod keys;
mod models;
mod store;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{RecordId, VehicleId};

pub use models::{
    BrakeService, BrakeServiceRecord, MIN_YEAR, MechanicService, MechanicServiceRecord, OilChange,
    OilChangeRecord, RecordDetails, ServiceRecord, Vehicle, VehicleInfo, WorkshopInfo,
    normalize_patente,
};
pub use store::{KeyValueStore, MemoryStore, StoreError};

/// Errors from tracker operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Form input failed validation. The message is user-facing.
    #[error("{0}")]
    Validation(String),

    #[error("vehicle not found: {0}")]
    VehicleNotFound(VehicleId),

    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode tracker value: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Tracker operations over a key-value store.
#[derive(Debug, Clone, Default)]
pub struct Tracker<S> {
    store: S,
}

impl<S: KeyValueStore> Tracker<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.store
    }

    // =========================================================================
    // Vehicles
    // =========================================================================

    /// All vehicles, in insertion order.
    #[must_use]
    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.read(keys::VEHICLES)
    }

    #[must_use]
    pub fn vehicle(&self, id: &VehicleId) -> Option<Vehicle> {
        self.vehicles().into_iter().find(|v| &v.id == id)
    }

    /// Vehicles matching every term of `query`; a blank query returns all.
    #[must_use]
    pub fn search_vehicles(&self, query: &str) -> Vec<Vehicle> {
        self.vehicles()
            .into_iter()
            .filter(|v| v.matches(query))
            .collect()
    }

    /// Validate and store a new vehicle under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the write fails.
    pub fn add_vehicle(&mut self, info: VehicleInfo) -> Result<Vehicle> {
        let info = info.normalized();
        info.validate()?;

        let vehicle = Vehicle {
            id: VehicleId::generate(),
            info,
        };
        let mut vehicles = self.vehicles();
        vehicles.push(vehicle.clone());
        self.write(keys::VEHICLES, &vehicles)?;
        Ok(vehicle)
    }

    /// Replace a stored vehicle's fields, keeping its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the vehicle is unknown, validation fails, or the
    /// write fails.
    pub fn update_vehicle(&mut self, vehicle: Vehicle) -> Result<Vehicle> {
        let info = vehicle.info.normalized();
        info.validate()?;

        let mut vehicles = self.vehicles();
        let slot = vehicles
            .iter_mut()
            .find(|v| v.id == vehicle.id)
            .ok_or_else(|| TrackerError::VehicleNotFound(vehicle.id.clone()))?;
        slot.info = info;
        let updated = slot.clone();
        self.write(keys::VEHICLES, &vehicles)?;
        Ok(updated)
    }

    /// Remove a vehicle and clear all of its service-record buckets.
    ///
    /// # Errors
    ///
    /// Returns an error if the vehicle is unknown or a write fails.
    pub fn delete_vehicle(&mut self, id: &VehicleId) -> Result<()> {
        let mut vehicles = self.vehicles();
        let before = vehicles.len();
        vehicles.retain(|v| &v.id != id);
        if vehicles.len() == before {
            return Err(TrackerError::VehicleNotFound(id.clone()));
        }

        self.write(keys::VEHICLES, &vehicles)?;
        for bucket in keys::RECORD_BUCKETS {
            self.store.remove(&keys::bucket(bucket, id))?;
        }
        Ok(())
    }

    // =========================================================================
    // Service records
    // =========================================================================

    /// Records of one kind for a vehicle, newest date first.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::VehicleNotFound`] for an unknown vehicle.
    pub fn records<D: RecordDetails>(&self, vehicle_id: &VehicleId) -> Result<Vec<ServiceRecord<D>>> {
        self.ensure_vehicle(vehicle_id)?;
        let mut records: Vec<ServiceRecord<D>> = self.read(&keys::bucket(D::BUCKET, vehicle_id));
        records.sort_by_key(|r| std::cmp::Reverse(r.details.date()));
        Ok(records)
    }

    /// One record by id.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown vehicle or record.
    pub fn record<D: RecordDetails>(
        &self,
        vehicle_id: &VehicleId,
        record_id: &RecordId,
    ) -> Result<ServiceRecord<D>> {
        self.records::<D>(vehicle_id)?
            .into_iter()
            .find(|r| &r.id == record_id)
            .ok_or_else(|| TrackerError::RecordNotFound(record_id.clone()))
    }

    /// Validate and store a new record under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns an error if the vehicle is unknown, validation fails, or the
    /// write fails.
    pub fn add_record<D: RecordDetails>(
        &mut self,
        vehicle_id: &VehicleId,
        details: D,
    ) -> Result<ServiceRecord<D>> {
        self.ensure_vehicle(vehicle_id)?;
        let details = details.normalized();
        details.validate()?;

        let record = ServiceRecord {
            id: RecordId::generate(),
            vehicle_id: vehicle_id.clone(),
            details,
        };
        let key = keys::bucket(D::BUCKET, vehicle_id);
        let mut records: Vec<ServiceRecord<D>> = self.read(&key);
        records.push(record.clone());
        self.write(&key, &records)?;
        Ok(record)
    }

    /// Replace a stored record's details, keeping its ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the vehicle or record is unknown, validation
    /// fails, or the write fails.
    pub fn update_record<D: RecordDetails>(
        &mut self,
        record: ServiceRecord<D>,
    ) -> Result<ServiceRecord<D>> {
        self.ensure_vehicle(&record.vehicle_id)?;
        let details = record.details.normalized();
        details.validate()?;

        let key = keys::bucket(D::BUCKET, &record.vehicle_id);
        let mut records: Vec<ServiceRecord<D>> = self.read(&key);
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| TrackerError::RecordNotFound(record.id.clone()))?;
        slot.details = details;
        let updated = slot.clone();
        self.write(&key, &records)?;
        Ok(updated)
    }

    /// Delete one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is unknown or the write fails.
    pub fn delete_record<D: RecordDetails>(
        &mut self,
        vehicle_id: &VehicleId,
        record_id: &RecordId,
    ) -> Result<()> {
        let key = keys::bucket(D::BUCKET, vehicle_id);
        let mut records: Vec<ServiceRecord<D>> = self.read(&key);
        let before = records.len();
        records.retain(|r| &r.id != record_id);
        if records.len() == before {
            return Err(TrackerError::RecordNotFound(record_id.clone()));
        }
        self.write(&key, &records)
    }

    // =========================================================================
    // Workshop
    // =========================================================================

    /// Stored workshop details, or the empty default.
    #[must_use]
    pub fn workshop_info(&self) -> WorkshopInfo {
        self.read(keys::WORKSHOP_INFO)
    }

    /// Replace the workshop details. Technician names are trimmed and
    /// blank or repeated names dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_workshop_info(&mut self, info: WorkshopInfo) -> Result<WorkshopInfo> {
        let mut technicians: Vec<String> = Vec::with_capacity(info.technicians.len());
        for name in info.technicians {
            let name = name.trim();
            if !name.is_empty() && !contains_name(&technicians, name) {
                technicians.push(name.to_owned());
            }
        }

        let info = WorkshopInfo {
            name: info.name.trim().to_owned(),
            address: info.address.trim().to_owned(),
            phone: info.phone.trim().to_owned(),
            website: info.website.trim().to_owned(),
            technicians,
        };
        self.write(keys::WORKSHOP_INFO, &info)?;
        Ok(info)
    }

    /// Add a technician to the workshop roster.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank or already listed name, or an
    /// error if the write fails.
    pub fn add_technician(&mut self, name: &str) -> Result<WorkshopInfo> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::Validation(
                "El nombre del técnico es obligatorio".to_owned(),
            ));
        }

        let mut info = self.workshop_info();
        if contains_name(&info.technicians, name) {
            return Err(TrackerError::Validation(format!(
                "El técnico {name} ya está registrado"
            )));
        }
        info.technicians.push(name.to_owned());
        self.write(keys::WORKSHOP_INFO, &info)?;
        Ok(info)
    }

    /// Remove a technician (case-insensitive). Returns whether one was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn remove_technician(&mut self, name: &str) -> Result<bool> {
        let mut info = self.workshop_info();
        let before = info.technicians.len();
        info.technicians
            .retain(|t| !t.eq_ignore_ascii_case(name.trim()));
        if info.technicians.len() == before {
            return Ok(false);
        }
        self.write(keys::WORKSHOP_INFO, &info)?;
        Ok(true)
    }

    // =========================================================================
    // Storage helpers
    // =========================================================================

    fn ensure_vehicle(&self, id: &VehicleId) -> Result<()> {
        if self.vehicle(id).is_none() {
            return Err(TrackerError::VehicleNotFound(id.clone()));
        }
        Ok(())
    }

    fn read<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.store.get(key) else {
            return T::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "Corrupt tracker value, using default");
            T::default()
        })
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, raw)?;
        Ok(())
    }
}

fn contains_name(names: &[String], name: &str) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(name))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn tracker() -> Tracker<MemoryStore> {
        Tracker::new(MemoryStore::new())
    }

    fn info(patente: &str) -> VehicleInfo {
        VehicleInfo {
            make: "Renault".to_owned(),
            model: "Kangoo".to_owned(),
            year: 2018,
            patente: patente.to_owned(),
            owner_name: "Carlos Díaz".to_owned(),
            owner_phone: Some("+54 9 11 5555-1234".to_owned()),
            image_url: None,
        }
    }

    fn oil(date: (i32, u32, u32), mileage: u32) -> OilChange {
        OilChange {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            mileage,
            next_change_mileage: Some(mileage + 10_000),
            oil_type: "10W-40".to_owned(),
            oil_brand: Some("Elaion".to_owned()),
            oil_filter: true,
            air_filter: false,
            fuel_filter: false,
            cabin_filter: false,
            notes: String::new(),
            technician: "Luis".to_owned(),
        }
    }

    fn brake() -> BrakeService {
        BrakeService {
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            mileage: 40_000,
            front_pads: true,
            rear_pads: false,
            front_discs: true,
            rear_discs: false,
            rear_shoes: false,
            brake_fluid: true,
            notes: String::new(),
            technician: "Luis".to_owned(),
        }
    }

    #[test]
    fn add_vehicle_assigns_id_and_normalizes() {
        let mut t = tracker();
        let v = t.add_vehicle(info("ac 123 bd")).unwrap();
        assert_eq!(v.info.patente, "AC123BD");
        assert_eq!(t.vehicle(&v.id), Some(v));
    }

    #[test]
    fn invalid_vehicle_is_not_stored() {
        let mut t = tracker();
        let mut bad = info("AA000AA");
        bad.make = "  ".to_owned();
        assert!(matches!(t.add_vehicle(bad), Err(TrackerError::Validation(_))));
        assert!(t.vehicles().is_empty());
    }

    #[test]
    fn deleting_vehicle_clears_its_buckets() {
        let mut t = tracker();
        let keep = t.add_vehicle(info("KEEP01")).unwrap();
        let gone = t.add_vehicle(info("GONE01")).unwrap();
        t.add_record(&gone.id, oil((2024, 1, 5), 30_000)).unwrap();
        t.add_record(&gone.id, brake()).unwrap();
        t.add_record(&keep.id, oil((2024, 2, 1), 12_000)).unwrap();

        t.delete_vehicle(&gone.id).unwrap();

        assert_eq!(t.vehicles(), vec![keep.clone()]);
        for bucket in keys::RECORD_BUCKETS {
            assert!(t.store().get(&keys::bucket(bucket, &gone.id)).is_none());
        }
        assert_eq!(t.records::<OilChange>(&keep.id).unwrap().len(), 1);
    }

    #[test]
    fn deleting_unknown_vehicle_is_not_found() {
        let mut t = tracker();
        assert!(matches!(
            t.delete_vehicle(&VehicleId::new("nope")),
            Err(TrackerError::VehicleNotFound(_))
        ));
    }

    #[test]
    fn records_are_listed_newest_first() {
        let mut t = tracker();
        let v = t.add_vehicle(info("ORD001")).unwrap();
        t.add_record(&v.id, oil((2023, 6, 1), 20_000)).unwrap();
        t.add_record(&v.id, oil((2024, 6, 1), 30_000)).unwrap();
        t.add_record(&v.id, oil((2023, 12, 1), 25_000)).unwrap();

        let mileages: Vec<u32> = t
            .records::<OilChange>(&v.id)
            .unwrap()
            .iter()
            .map(|r| r.details.mileage)
            .collect();
        assert_eq!(mileages, vec![30_000, 25_000, 20_000]);
    }

    #[test]
    fn record_for_unknown_vehicle_is_rejected() {
        let mut t = tracker();
        let err = t
            .add_record(&VehicleId::new("ghost"), brake())
            .unwrap_err();
        assert!(matches!(err, TrackerError::VehicleNotFound(_)));
    }

    #[test]
    fn update_and_delete_record() {
        let mut t = tracker();
        let v = t.add_vehicle(info("UPD001")).unwrap();
        let mut record = t.add_record(&v.id, oil((2024, 1, 1), 10_000)).unwrap();

        record.details.notes = "  cambio de junta ".to_owned();
        let updated = t.update_record(record.clone()).unwrap();
        assert_eq!(updated.details.notes, "cambio de junta");
        assert_eq!(
            t.record::<OilChange>(&v.id, &record.id).unwrap().details.notes,
            "cambio de junta"
        );

        t.delete_record::<OilChange>(&v.id, &record.id).unwrap();
        assert!(t.records::<OilChange>(&v.id).unwrap().is_empty());
        assert!(matches!(
            t.delete_record::<OilChange>(&v.id, &record.id),
            Err(TrackerError::RecordNotFound(_))
        ));
    }

    #[test]
    fn corrupt_values_read_as_defaults() {
        let mut store = MemoryStore::new();
        store.set(keys::VEHICLES, "{not json".to_owned()).unwrap();
        store.set(keys::WORKSHOP_INFO, "[1,2]".to_owned()).unwrap();
        let t = Tracker::new(store);

        assert!(t.vehicles().is_empty());
        assert_eq!(t.workshop_info(), WorkshopInfo::default());
    }

    #[test]
    fn technicians_are_unique_case_insensitively() {
        let mut t = tracker();
        t.add_technician("Luis").unwrap();
        assert!(t.add_technician("luis").is_err());
        assert!(t.add_technician("   ").is_err());
        t.add_technician("Marta").unwrap();

        assert!(t.remove_technician("LUIS").unwrap());
        assert!(!t.remove_technician("Luis").unwrap());
        assert_eq!(t.workshop_info().technicians, vec!["Marta".to_owned()]);
    }

    #[test]
    fn saving_workshop_cleans_roster() {
        let mut t = tracker();
        let saved = t
            .save_workshop_info(WorkshopInfo {
                name: " Frenos Sur ".to_owned(),
                technicians: vec!["Ana".to_owned(), " ".to_owned(), "ANA".to_owned()],
                ..WorkshopInfo::default()
            })
            .unwrap();
        assert_eq!(saved.name, "Frenos Sur");
        assert_eq!(saved.technicians, vec!["Ana".to_owned()]);
        assert_eq!(t.workshop_info(), saved);
    }
}
