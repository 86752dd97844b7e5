//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Errors answer with the JSON envelope the storefront scripts expect:
//! `{"success": false, "error": "<mensaje>"}`. Messages are user-facing
//! Spanish text; internal details never leave the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use frenos_core::TrackerError;
use frenos_core::tracker::backup::BackupError;
use serde::Serialize;
use thiserror::Error;

use crate::services::{EmailError, TrackerTaskError, WhatsAppError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Tracker operation failed.
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// Tracker task could not run.
    #[error("Tracker task error: {0}")]
    TrackerTask(#[from] TrackerTaskError),

    /// Backup import failed.
    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),

    /// Contact email delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// WhatsApp link could not be built.
    #[error("WhatsApp error: {0}")]
    WhatsApp(#[from] WhatsAppError),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Settings file could not be read.
    #[error("Settings file error: {0}")]
    Settings(#[from] std::io::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Feature not configured on this deployment.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Tracker(err) => match err {
                TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
                TrackerError::VehicleNotFound(_) | TrackerError::RecordNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                TrackerError::Store(_) | TrackerError::Encode(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Backup(BackupError::Store(_))
            | Self::TrackerTask(_)
            | Self::Session(_)
            | Self::Settings(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backup(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Email(_) => StatusCode::BAD_GATEWAY,
            Self::WhatsApp(WhatsAppError::NotConfigured) | Self::ServiceUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::WhatsApp(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message safe to show to the visitor.
    fn public_message(&self) -> String {
        match self {
            Self::Tracker(TrackerError::Validation(msg))
            | Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::ServiceUnavailable(msg) => msg.clone(),
            Self::Tracker(TrackerError::VehicleNotFound(_)) => {
                "Vehículo no encontrado".to_string()
            }
            Self::Tracker(TrackerError::RecordNotFound(_)) => "Registro no encontrado".to_string(),
            Self::Backup(BackupError::UnsupportedVersion(v)) => {
                format!("Versión de copia de seguridad no soportada: {v}")
            }
            Self::Backup(BackupError::ForeignKey(_) | BackupError::InvalidValue { .. }) => {
                "El archivo de copia de seguridad no es válido".to_string()
            }
            Self::Email(_) => {
                "No pudimos enviar tu mensaje. Intentá nuevamente más tarde.".to_string()
            }
            Self::WhatsApp(WhatsAppError::NotConfigured) => {
                "WhatsApp no está configurado".to_string()
            }
            _ => "Error interno del servidor".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            success: false,
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frenos_core::VehicleId;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("producto".to_string());
        assert_eq!(err.to_string(), "Not found: producto");
    }

    #[tokio::test]
    async fn test_validation_message_is_passed_through() {
        let (status, body) = body_of(AppError::Tracker(TrackerError::Validation(
            "La patente es obligatoria".to_string(),
        )))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "La patente es obligatoria");
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let (status, body) = body_of(AppError::Tracker(TrackerError::VehicleNotFound(
            VehicleId::new("x"),
        )))
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Vehículo no encontrado");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, body) = body_of(AppError::Internal("db password leaked".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error interno del servidor");
    }

    #[tokio::test]
    async fn test_whatsapp_not_configured_is_503() {
        let (status, _) = body_of(AppError::WhatsApp(WhatsAppError::NotConfigured)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
