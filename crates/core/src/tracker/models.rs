//! Tracker entities.
//!
//! Field names serialize in camelCase so stored JSON and backups keep the
//! layout the tracker has always used.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::TrackerError;
use super::keys;
use crate::{RecordId, VehicleId};

/// Earliest model year the tracker accepts.
pub const MIN_YEAR: i32 = 1900;

/// Vehicle fields supplied by a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub make: String,
    pub model: String,
    pub year: i32,
    /// License plate.
    pub patente: String,
    pub owner_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl VehicleInfo {
    /// Trim text fields, normalize the plate and blank optionals to `None`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            make: self.make.trim().to_owned(),
            model: self.model.trim().to_owned(),
            year: self.year,
            patente: normalize_patente(&self.patente),
            owner_name: self.owner_name.trim().to_owned(),
            owner_phone: non_blank(self.owner_phone),
            image_url: non_blank(self.image_url),
        }
    }

    /// Form-level checks. Call on normalized input.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), TrackerError> {
        require(&self.make, "La marca es obligatoria")?;
        require(&self.model, "El modelo es obligatorio")?;
        require(&self.patente, "La patente es obligatoria")?;
        require(&self.owner_name, "El nombre del propietario es obligatorio")?;

        let max_year = Utc::now().year() + 1;
        if !(MIN_YEAR..=max_year).contains(&self.year) {
            return Err(TrackerError::Validation(format!(
                "El año debe estar entre {MIN_YEAR} y {max_year}"
            )));
        }
        Ok(())
    }
}

/// A customer vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: VehicleId,
    #[serde(flatten)]
    pub info: VehicleInfo,
}

impl Vehicle {
    /// Whether every term of `query` appears in the plate, make, model or owner.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let haystack = format!(
            "{} {} {} {}",
            self.info.patente, self.info.make, self.info.model, self.info.owner_name
        )
        .to_lowercase();
        query
            .split_whitespace()
            .all(|term| haystack.contains(&term.to_lowercase()))
    }
}

/// Uppercase a plate and drop all whitespace: `"ab 123 cd"` → `"AB123CD"`.
#[must_use]
pub fn normalize_patente(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Behavior shared by the service-specific part of each record kind.
pub trait RecordDetails: Clone + Serialize + for<'de> Deserialize<'de> {
    /// Bucket name in the key layout, see [`keys::RECORD_BUCKETS`].
    const BUCKET: &'static str;

    /// Service date, used for newest-first ordering.
    fn date(&self) -> NaiveDate;

    /// Trim free-text fields.
    #[must_use]
    fn normalized(self) -> Self;

    /// Form-level checks. Call on normalized input.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] when a required field is blank.
    fn validate(&self) -> Result<(), TrackerError> {
        Ok(())
    }
}

/// A stored service record: ids plus the kind-specific details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "D: RecordDetails"))]
pub struct ServiceRecord<D> {
    pub id: RecordId,
    pub vehicle_id: VehicleId,
    #[serde(flatten)]
    pub details: D,
}

pub type OilChangeRecord = ServiceRecord<OilChange>;
pub type BrakeServiceRecord = ServiceRecord<BrakeService>;
pub type MechanicServiceRecord = ServiceRecord<MechanicService>;

/// Oil change and filter replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OilChange {
    pub date: NaiveDate,
    /// Odometer reading in kilometres.
    pub mileage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_change_mileage: Option<u32>,
    /// Viscosity/grade, e.g. `10W-40`.
    pub oil_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oil_brand: Option<String>,
    #[serde(default)]
    pub oil_filter: bool,
    #[serde(default)]
    pub air_filter: bool,
    #[serde(default)]
    pub fuel_filter: bool,
    #[serde(default)]
    pub cabin_filter: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub technician: String,
}

impl RecordDetails for OilChange {
    const BUCKET: &'static str = keys::OIL_CHANGES;

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn normalized(self) -> Self {
        Self {
            oil_type: self.oil_type.trim().to_owned(),
            oil_brand: non_blank(self.oil_brand),
            notes: self.notes.trim().to_owned(),
            technician: self.technician.trim().to_owned(),
            ..self
        }
    }

    fn validate(&self) -> Result<(), TrackerError> {
        require(&self.oil_type, "El tipo de aceite es obligatorio")?;
        if let Some(next) = self.next_change_mileage
            && next <= self.mileage
        {
            return Err(TrackerError::Validation(
                "El próximo cambio debe superar el kilometraje actual".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Brake work: which components were replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrakeService {
    pub date: NaiveDate,
    pub mileage: u32,
    #[serde(default)]
    pub front_pads: bool,
    #[serde(default)]
    pub rear_pads: bool,
    #[serde(default)]
    pub front_discs: bool,
    #[serde(default)]
    pub rear_discs: bool,
    #[serde(default)]
    pub rear_shoes: bool,
    #[serde(default)]
    pub brake_fluid: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub technician: String,
}

impl RecordDetails for BrakeService {
    const BUCKET: &'static str = keys::BRAKE_SERVICES;

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn normalized(self) -> Self {
        Self {
            notes: self.notes.trim().to_owned(),
            technician: self.technician.trim().to_owned(),
            ..self
        }
    }
}

/// General mechanical work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MechanicService {
    pub date: NaiveDate,
    pub mileage: u32,
    pub description: String,
    #[serde(default)]
    pub alignment: bool,
    #[serde(default)]
    pub balancing: bool,
    #[serde(default)]
    pub suspension: bool,
    #[serde(default)]
    pub timing_belt: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub technician: String,
}

impl RecordDetails for MechanicService {
    const BUCKET: &'static str = keys::MECHANIC_SERVICES;

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn normalized(self) -> Self {
        Self {
            description: self.description.trim().to_owned(),
            notes: self.notes.trim().to_owned(),
            technician: self.technician.trim().to_owned(),
            ..self
        }
    }

    fn validate(&self) -> Result<(), TrackerError> {
        require(&self.description, "La descripción del trabajo es obligatoria")
    }
}

/// Workshop details printed on reports and owner notices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkshopInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub technicians: Vec<String>,
}

fn require(value: &str, message: &str) -> Result<(), TrackerError> {
    if value.is_empty() {
        return Err(TrackerError::Validation(message.to_owned()));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn info(year: i32) -> VehicleInfo {
        VehicleInfo {
            make: " Ford ".to_owned(),
            model: "Focus".to_owned(),
            year,
            patente: "ab 123 cd".to_owned(),
            owner_name: "Ana".to_owned(),
            owner_phone: Some("  ".to_owned()),
            image_url: None,
        }
    }

    #[test]
    fn normalizes_plate_and_blanks() {
        let n = info(2015).normalized();
        assert_eq!(n.patente, "AB123CD");
        assert_eq!(n.make, "Ford");
        assert_eq!(n.owner_phone, None);
        assert!(n.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_years() {
        assert!(info(1899).normalized().validate().is_err());
        let next = Utc::now().year() + 1;
        assert!(info(next).normalized().validate().is_ok());
        assert!(info(next + 1).normalized().validate().is_err());
    }

    #[test]
    fn records_flatten_to_the_stored_layout() {
        let json = r#"{
            "id": "r1", "vehicleId": "v1", "date": "2024-05-02", "mileage": 52000,
            "nextChangeMileage": 62000, "oilType": "10W-40", "oilFilter": true,
            "airFilter": false, "fuelFilter": false, "cabinFilter": true,
            "notes": "", "technician": "Luis"
        }"#;
        let record: OilChangeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.vehicle_id.as_str(), "v1");
        assert_eq!(record.details.next_change_mileage, Some(62_000));
        assert!(record.details.cabin_filter);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["vehicleId"], "v1");
        assert_eq!(value["oilType"], "10W-40");
    }

    #[test]
    fn next_change_must_exceed_mileage() {
        let change = OilChange {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            mileage: 10_000,
            next_change_mileage: Some(9_000),
            oil_type: "5W-30".to_owned(),
            oil_brand: None,
            oil_filter: true,
            air_filter: false,
            fuel_filter: false,
            cabin_filter: false,
            notes: String::new(),
            technician: String::new(),
        };
        assert!(change.validate().is_err());
    }

    #[test]
    fn vehicle_search_matches_all_terms() {
        let vehicle = Vehicle {
            id: VehicleId::new("v"),
            info: info(2015).normalized(),
        };
        assert!(vehicle.matches("ab123 ford"));
        assert!(vehicle.matches("ANA"));
        assert!(!vehicle.matches("toyota"));
    }
}
