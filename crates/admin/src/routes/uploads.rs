//! Product image uploads.
//!
//! Both endpoints take a multipart form with a single `file` field and
//! answer with the URL to store in the product's `imageUrl`.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use tracing::instrument;

use super::api::{self, ApiResponse};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::services::{ImageUpload, UploadError, uploads};
use crate::state::AppState;

/// Request body limit for the upload routes, leaving room for the
/// multipart framing around a maximum-size image.
pub const UPLOAD_BODY_LIMIT: usize = uploads::MAX_UPLOAD_BYTES + 64 * 1024;

/// Where an uploaded image ended up.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

/// Pull the `file` field out of the form.
async fn read_image(mut multipart: Multipart) -> Result<ImageUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Formulario inválido: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("No se pudo leer el archivo: {e}")))?;

        return Ok(ImageUpload::new(
            file_name.as_deref(),
            content_type.as_deref(),
            bytes.to_vec(),
        )?);
    }

    Err(UploadError::MissingFile.into())
}

/// Store an image in the local upload directory.
///
/// POST /api/uploads/local
#[instrument(skip(_admin, state, multipart))]
pub async fn local(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResult>>> {
    let upload = read_image(multipart).await?;
    let (_, url) = uploads::store_local(&state.config().upload_dir, &upload).await?;

    Ok(api::done(
        "Imagen guardada",
        UploadResult {
            url,
            public_id: None,
        },
    ))
}

/// Send an image to the hosted media service.
///
/// POST /api/uploads/media
#[instrument(skip(_admin, state, multipart))]
pub async fn media(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResult>>> {
    let client = state.media().ok_or_else(|| {
        AppError::ServiceUnavailable(
            "El servicio de imágenes no está configurado".to_string(),
        )
    })?;

    let upload = read_image(multipart).await?;
    let public_id = upload.stem().to_owned();
    let uploaded = client
        .upload(&public_id, &upload.content_type, upload.bytes)
        .await?;

    Ok(api::done(
        "Imagen subida",
        UploadResult {
            url: uploaded.url,
            public_id: Some(uploaded.public_id),
        },
    ))
}
