//! Unified error handling for admin.
//!
//! Errors answer with the JSON envelope the admin scripts expect:
//! `{"success": false, "error": "<mensaje>"}`. Server errors are captured to
//! Sentry and reported to the client without internal details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use frenos_core::{CatalogError, EnvFileError};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{EmailError, MediaError, UploadError};

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Settings file could not be read or written.
    #[error("Settings error: {0}")]
    Settings(#[from] EnvFileError),

    /// Built-in catalog failed to load.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Upload rejected or not stored.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Hosted media service failed.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// SMTP delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

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
            Self::Database(_)
            | Self::Settings(EnvFileError::Io(_))
            | Self::Catalog(_)
            | Self::Upload(UploadError::Io(_))
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Settings(EnvFileError::InvalidKey(_))
            | Self::Upload(UploadError::MissingFile | UploadError::NotAnImage(_))
            | Self::Email(EmailError::InvalidAddress(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upload(UploadError::TooLarge(_)) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Email(EmailError::NotConfigured(_)) | Self::ServiceUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Media(_) | Self::Email(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message safe to show to the admin.
    fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::ServiceUnavailable(msg) => msg.clone(),
            Self::Settings(EnvFileError::InvalidKey(key)) => {
                format!("Clave de configuración inválida: {key}")
            }
            Self::Upload(UploadError::MissingFile) => "No se recibió ningún archivo".to_string(),
            Self::Upload(UploadError::NotAnImage(_)) => {
                "Solo se aceptan imágenes".to_string()
            }
            Self::Upload(UploadError::TooLarge(_)) => {
                "La imagen supera el tamaño máximo de 5 MB".to_string()
            }
            Self::Email(EmailError::NotConfigured(key)) => {
                format!("SMTP no está configurado: falta {key}")
            }
            Self::Email(EmailError::InvalidAddress(address)) => {
                format!("Dirección de correo inválida: {address}")
            }
            Self::Email(_) => "No se pudo enviar el correo".to_string(),
            Self::Media(_) => "El servicio de imágenes rechazó la subida".to_string(),
            _ => "Error interno del servidor".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
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

/// Tag Sentry events with the logged-in admin.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("producto".to_string());
        assert_eq!(err.to_string(), "Not found: producto");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Upload(UploadError::TooLarge(1))),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            get_status(AppError::Email(EmailError::NotConfigured("SMTP_HOST"))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Internal("connection refused at 10.0.0.3".to_string())
            .into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Error interno del servidor");
    }
}
