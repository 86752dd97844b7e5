//! JSON envelope shared by the storefront APIs.
//!
//! Successful mutations answer `{"success": true, "message": "...", "data": ...}`;
//! failures come from [`AppError`](crate::error::AppError) as
//! `{"success": false, "error": "..."}`.

use axum::Json;
use serde::Serialize;

/// Successful API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// A prefilled `wa.me` link and the message it carries.
#[derive(Debug, Serialize)]
pub struct WhatsAppLink {
    pub url: String,
    pub message: String,
}

/// `{success: true, data}`.
pub fn data<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: None,
        data: Some(data),
    })
}

/// `{success: true, message, data}`.
pub fn done<T: Serialize>(message: impl Into<String>, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: Some(message.into()),
        data: Some(data),
    })
}

/// `{success: true, message}` with no payload.
pub fn ok(message: impl Into<String>) -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        success: true,
        message: Some(message.into()),
        data: None,
    })
}
