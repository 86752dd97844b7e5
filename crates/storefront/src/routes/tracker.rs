//! Vehicle service tracker API.
//!
//! Vehicles, their oil changes, brake services and mechanic services, and
//! the workshop profile. Data belongs to the visitor's session: every
//! handler takes the session's [`TrackerOwner`] and runs its tracker work
//! through [`TrackerHandle::run`](crate::services::TrackerHandle::run),
//! which serializes access to the data files.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use frenos_core::tracker::backup::{self, Backup};
use frenos_core::tracker::{
    BrakeService, MechanicService, OilChange, RecordDetails, ServiceRecord, Vehicle, VehicleInfo,
    WorkshopInfo,
};
use frenos_core::{PhoneNumber, RecordId, TrackerError, VehicleId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::api::{self, ApiResponse, WhatsAppLink};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::{TrackerOwner, whatsapp};
use crate::state::AppState;

/// A record kind exposed over the API.
pub trait RecordKind: RecordDetails + Send + Sync + 'static {
    /// Spanish label used in response messages.
    const LABEL: &'static str;
}

impl RecordKind for OilChange {
    const LABEL: &'static str = "Cambio de aceite";
}

impl RecordKind for BrakeService {
    const LABEL: &'static str = "Servicio de frenos";
}

impl RecordKind for MechanicService {
    const LABEL: &'static str = "Servicio mecánico";
}

/// Vehicle search.
#[derive(Debug, Default, Deserialize)]
pub struct VehicleQuery {
    pub q: Option<String>,
}

/// New technician.
#[derive(Debug, Deserialize)]
pub struct TechnicianRequest {
    pub name: String,
}

/// Count of keys written by a backup import.
#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
}

// =============================================================================
// Vehicles
// =============================================================================

/// List vehicles, optionally filtered by `?q=`.
#[instrument(skip(state), fields(%owner))]
pub async fn list_vehicles(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Query(query): Query<VehicleQuery>,
) -> Result<Json<ApiResponse<Vec<Vehicle>>>> {
    let q = query.q.unwrap_or_default();
    let vehicles = state
        .tracker()
        .run(owner, move |t| {
            if q.trim().is_empty() {
                t.vehicles()
            } else {
                t.search_vehicles(&q)
            }
        })
        .await?;
    Ok(api::data(vehicles))
}

/// Register a vehicle.
#[instrument(skip(state, info), fields(%owner))]
pub async fn create_vehicle(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Json(info): Json<VehicleInfo>,
) -> Result<Json<ApiResponse<Vehicle>>> {
    let vehicle = state.tracker().run(owner, move |t| t.add_vehicle(info)).await??;
    add_breadcrumb(
        "tracker",
        "Vehicle added",
        Some(&[("vehicle", vehicle.id.as_str())][..]),
    );
    Ok(api::done("Vehículo agregado", vehicle))
}

/// One vehicle.
#[instrument(skip(state), fields(%owner))]
pub async fn get_vehicle(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Path(id): Path<VehicleId>,
) -> Result<Json<ApiResponse<Vehicle>>> {
    let lookup = id.clone();
    let vehicle = state
        .tracker()
        .run(owner, move |t| t.vehicle(&lookup))
        .await?
        .ok_or(TrackerError::VehicleNotFound(id))?;
    Ok(api::data(vehicle))
}

/// Replace a vehicle's details.
#[instrument(skip(state, info), fields(%owner))]
pub async fn update_vehicle(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Path(id): Path<VehicleId>,
    Json(info): Json<VehicleInfo>,
) -> Result<Json<ApiResponse<Vehicle>>> {
    let vehicle = state
        .tracker()
        .run(owner, move |t| t.update_vehicle(Vehicle { id, info }))
        .await??;
    Ok(api::done("Vehículo actualizado", vehicle))
}

/// Delete a vehicle and all of its service records.
#[instrument(skip(state), fields(%owner))]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Path(id): Path<VehicleId>,
) -> Result<Json<ApiResponse<()>>> {
    state.tracker().run(owner, move |t| t.delete_vehicle(&id)).await??;
    Ok(api::ok("Vehículo eliminado"))
}

// =============================================================================
// Service records
// =============================================================================

/// Records of one kind for a vehicle, newest first.
#[instrument(skip(state), fields(%owner, kind = D::LABEL))]
pub async fn list_records<D: RecordKind>(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Path(vehicle_id): Path<VehicleId>,
) -> Result<Json<ApiResponse<Vec<ServiceRecord<D>>>>> {
    let records = state
        .tracker()
        .run(owner, move |t| t.records::<D>(&vehicle_id))
        .await??;
    Ok(api::data(records))
}

/// Add a record for a vehicle.
#[instrument(skip(state, details), fields(%owner, kind = D::LABEL))]
pub async fn create_record<D: RecordKind>(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Path(vehicle_id): Path<VehicleId>,
    Json(details): Json<D>,
) -> Result<Json<ApiResponse<ServiceRecord<D>>>> {
    let record = state
        .tracker()
        .run(owner, move |t| t.add_record(&vehicle_id, details))
        .await??;
    Ok(api::done(format!("{} registrado", D::LABEL), record))
}

/// Replace a record's details.
#[instrument(skip(state, details), fields(%owner, kind = D::LABEL))]
pub async fn update_record<D: RecordKind>(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Path((vehicle_id, id)): Path<(VehicleId, RecordId)>,
    Json(details): Json<D>,
) -> Result<Json<ApiResponse<ServiceRecord<D>>>> {
    let record = state
        .tracker()
        .run(owner, move |t| {
            t.update_record(ServiceRecord {
                id,
                vehicle_id,
                details,
            })
        })
        .await??;
    Ok(api::done(format!("{} actualizado", D::LABEL), record))
}

/// Delete a record.
#[instrument(skip(state), fields(%owner, kind = D::LABEL))]
pub async fn delete_record<D: RecordKind>(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Path((vehicle_id, id)): Path<(VehicleId, RecordId)>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .tracker()
        .run(owner, move |t| t.delete_record::<D>(&vehicle_id, &id))
        .await??;
    Ok(api::ok(format!("{} eliminado", D::LABEL)))
}

/// WhatsApp notice to the vehicle owner about an oil change.
#[instrument(skip(state), fields(%owner))]
pub async fn oil_change_whatsapp(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Path((vehicle_id, id)): Path<(VehicleId, RecordId)>,
) -> Result<Json<ApiResponse<WhatsAppLink>>> {
    let (vehicle, record, workshop) = state
        .tracker()
        .run(owner, move |t| -> std::result::Result<_, TrackerError> {
            let record = t.record::<OilChange>(&vehicle_id, &id)?;
            let vehicle = t
                .vehicle(&vehicle_id)
                .ok_or(TrackerError::VehicleNotFound(vehicle_id))?;
            Ok((vehicle, record, t.workshop_info()))
        })
        .await??;

    let phone = vehicle
        .info
        .owner_phone
        .as_deref()
        .and_then(|raw| PhoneNumber::parse(raw).ok())
        .ok_or_else(|| {
            AppError::BadRequest(
                "El vehículo no tiene un teléfono válido del propietario".to_string(),
            )
        })?;

    let message = whatsapp::oil_change_message(&vehicle, &record, &workshop)?;
    Ok(api::data(WhatsAppLink {
        url: whatsapp::link(&phone, &message),
        message,
    }))
}

// =============================================================================
// Workshop
// =============================================================================

/// The workshop profile (defaults when never saved).
#[instrument(skip(state), fields(%owner))]
pub async fn get_workshop(
    State(state): State<AppState>,
    owner: TrackerOwner,
) -> Result<Json<ApiResponse<WorkshopInfo>>> {
    let info = state.tracker().run(owner, |t| t.workshop_info()).await?;
    Ok(api::data(info))
}

/// Save the workshop profile.
#[instrument(skip(state, info), fields(%owner))]
pub async fn save_workshop(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Json(info): Json<WorkshopInfo>,
) -> Result<Json<ApiResponse<WorkshopInfo>>> {
    let saved = state
        .tracker()
        .run(owner, move |t| t.save_workshop_info(info))
        .await??;
    Ok(api::done("Información del taller guardada", saved))
}

/// Add a technician to the workshop.
#[instrument(skip(state), fields(%owner))]
pub async fn add_technician(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Json(req): Json<TechnicianRequest>,
) -> Result<Json<ApiResponse<WorkshopInfo>>> {
    let info = state
        .tracker()
        .run(owner, move |t| t.add_technician(&req.name))
        .await??;
    Ok(api::done("Técnico agregado", info))
}

/// Remove a technician by name.
#[instrument(skip(state), fields(%owner))]
pub async fn remove_technician(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let removed = state
        .tracker()
        .run(owner, move |t| t.remove_technician(&name))
        .await??;
    if !removed {
        return Err(AppError::NotFound("Técnico no encontrado".to_string()));
    }
    Ok(api::ok("Técnico eliminado"))
}

// =============================================================================
// Backup
// =============================================================================

/// Download the visitor's tracker data as a backup file.
#[instrument(skip(state), fields(%owner))]
pub async fn export_backup(
    State(state): State<AppState>,
    owner: TrackerOwner,
) -> Result<impl IntoResponse> {
    let backup = state.tracker().run(owner, |t| backup::export(t.store())).await?;
    let disposition = format!(
        "attachment; filename=\"frenos-backup-{}.json\"",
        backup.exported_at.format("%Y-%m-%d")
    );
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(backup)))
}

/// Restore a backup, replacing the visitor's tracker data.
#[instrument(skip(state, file), fields(%owner))]
pub async fn import_backup(
    State(state): State<AppState>,
    owner: TrackerOwner,
    Json(file): Json<Backup>,
) -> Result<Json<ApiResponse<ImportSummary>>> {
    let imported = state
        .tracker()
        .run(owner, move |t| backup::import(t.store_mut(), &file))
        .await??;
    tracing::info!(imported, "Tracker backup restored");
    Ok(api::done(
        "Copia de seguridad restaurada",
        ImportSummary { imported },
    ))
}
