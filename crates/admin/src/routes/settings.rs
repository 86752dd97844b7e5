//! Store settings routes.
//!
//! Two stores:
//! - the `KEY=value` settings file shared with the storefront (WhatsApp
//!   number, SMTP details, ...), read merged over the process environment;
//! - the `frenos.settings` table for JSON values such as `category_images`.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
};
use frenos_core::settings::KNOWN_KEYS;
use frenos_core::{Email, PhoneNumber};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::instrument;

use super::api::{self, ApiResponse};
use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::services::settings_file;
use crate::state::AppState;

const MAX_STORE_KEY_LEN: usize = 100;

/// Settings file values merged over the environment.
#[derive(Debug, Serialize)]
pub struct EnvSettings {
    pub values: BTreeMap<String, String>,
    /// Keys the editor offers.
    pub keys: &'static [&'static str],
}

/// One row of the settings table.
#[derive(Debug, Serialize)]
pub struct StoredSetting {
    pub key: String,
    pub value: JsonValue,
}

/// GET /api/settings/env
#[instrument(skip(_admin, state))]
pub async fn env_settings(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<EnvSettings>>> {
    let file = settings_file::read(&state.config().settings_file).await?;
    Ok(api::data(EnvSettings {
        values: file.merged_over_env(KNOWN_KEYS),
        keys: KNOWN_KEYS,
    }))
}

/// Write `KEY=value` pairs to the settings file. An empty value removes
/// the key from the file, so the environment value applies again. Only
/// editable keys may be set or removed; nothing is written if any pair is
/// rejected.
///
/// PUT /api/settings/env
#[instrument(skip(_admin, state, values))]
pub async fn save_env_settings(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Json(values): Json<BTreeMap<String, String>>,
) -> Result<Json<ApiResponse<EnvSettings>>> {
    let path = &state.config().settings_file;
    let mut file = settings_file::read(path).await?;

    for (key, value) in &values {
        ensure_editable(key)?;
        let value = value.trim();
        if value.is_empty() {
            file.remove(key);
            continue;
        }
        validate_env_value(key, value)?;
        file.set(key, value)?;
    }

    let values_now = file.merged_over_env(KNOWN_KEYS);
    settings_file::write(path, file).await?;
    tracing::info!(keys = ?values.keys().collect::<Vec<_>>(), "Settings file updated");

    Ok(api::done(
        "Configuración guardada",
        EnvSettings {
            values: values_now,
            keys: KNOWN_KEYS,
        },
    ))
}

/// Only keys the editor offers may be written or removed.
fn ensure_editable(key: &str) -> Result<()> {
    if KNOWN_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Clave no editable: {key}")))
    }
}

/// Reject values the servers could not use.
fn validate_env_value(key: &str, value: &str) -> Result<()> {
    if value.contains('\n') {
        return Err(AppError::BadRequest(format!(
            "{key}: el valor no puede tener saltos de línea"
        )));
    }

    match key {
        "WHATSAPP_NUMBER" => {
            PhoneNumber::parse(value)
                .map_err(|e| AppError::BadRequest(format!("{key}: {e}")))?;
        }
        "STORE_EMAIL" | "CONTACT_EMAIL_TO" => {
            Email::parse(value).map_err(|e| AppError::BadRequest(format!("{key}: {e}")))?;
        }
        "SMTP_PORT" => {
            value.parse::<u16>().map_err(|_| {
                AppError::BadRequest(format!("{key}: puerto inválido"))
            })?;
        }
        _ => {}
    }
    Ok(())
}

fn validate_store_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_STORE_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Clave de configuración inválida: {key}"
        )))
    }
}

/// GET /api/settings/store/{key}
#[instrument(skip(_admin, state))]
pub async fn get_stored(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<StoredSetting>>> {
    validate_store_key(&key)?;
    let value = db::settings::get_setting(state.pool(), &key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Configuración no encontrada: {key}")))?;
    Ok(api::data(StoredSetting { key, value }))
}

/// PUT /api/settings/store/{key}
#[instrument(skip(_admin, state, value))]
pub async fn put_stored(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(value): Json<JsonValue>,
) -> Result<Json<ApiResponse<StoredSetting>>> {
    validate_store_key(&key)?;
    db::settings::set_setting(state.pool(), &key, &value).await?;
    tracing::info!(key = %key, "Setting saved");
    Ok(api::done("Configuración guardada", StoredSetting { key, value }))
}

/// DELETE /api/settings/store/{key}
#[instrument(skip(_admin, state))]
pub async fn delete_stored(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    validate_store_key(&key)?;
    if !db::settings::delete_setting(state.pool(), &key).await? {
        return Err(AppError::NotFound(format!(
            "Configuración no encontrada: {key}"
        )));
    }
    tracing::info!(key = %key, "Setting deleted");
    Ok(api::ok("Configuración eliminada"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_only_known_keys_are_editable() {
        assert!(ensure_editable("DATABASE_URL").is_err());
        assert!(ensure_editable("ADMIN_PASSWORD_HASH").is_err());
        assert!(ensure_editable("RESEND_API_KEY").is_err());
        assert!(ensure_editable("STORE_NAME").is_ok());
    }

    #[test]
    fn test_env_values_are_checked() {
        assert!(validate_env_value("WHATSAPP_NUMBER", "12").is_err());
        assert!(validate_env_value("WHATSAPP_NUMBER", "+54 9 11 5555-0000").is_ok());
        assert!(validate_env_value("CONTACT_EMAIL_TO", "no-es-correo").is_err());
        assert!(validate_env_value("SMTP_PORT", "70000").is_err());
        assert!(validate_env_value("SMTP_PORT", "465").is_ok());
        assert!(validate_env_value("STORE_NAME", "a\nb").is_err());
    }

    #[test]
    fn test_store_keys() {
        assert!(validate_store_key("category_images").is_ok());
        assert!(validate_store_key("").is_err());
        assert!(validate_store_key("a b").is_err());
        assert!(validate_store_key(&"k".repeat(101)).is_err());
    }
}
