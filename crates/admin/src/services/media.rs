//! Hosted media uploads (Cloudinary-compatible signed upload API).
//!
//! Uploads are signed with SHA-256 over the sorted request parameters
//! followed by the API secret, hex encoded.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::instrument;

use crate::config::MediaConfig;

/// Folder uploaded images are grouped under.
pub const UPLOAD_FOLDER: &str = "frenos";

/// Errors from the media service.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// A stored image.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for the hosted media API.
#[derive(Clone)]
pub struct MediaClient {
    client: reqwest::Client,
    config: MediaConfig,
}

impl MediaClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: MediaConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.config.api_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Upload an image.
    ///
    /// `public_id` names the stored asset inside [`UPLOAD_FOLDER`].
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects the upload.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        public_id: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[
                ("folder", UPLOAD_FOLDER),
                ("public_id", public_id),
                ("timestamp", &timestamp),
            ],
            self.config.api_secret.expose_secret(),
        );

        let file = reqwest::multipart::Part::bytes(bytes)
            .file_name(public_id.to_owned())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("folder", UPLOAD_FOLDER)
            .text("public_id", public_id.to_owned())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or(body, |e| e.error.message);
            tracing::error!(status = %status, message = %message, "Media upload rejected");
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::info!(public_id = %uploaded.public_id, "Image uploaded to media service");
        Ok(UploadedImage {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}

/// Request signature: SHA-256 of `k1=v1&k2=v2...` (keys sorted) followed by
/// the secret, hex encoded.
#[must_use]
pub fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut pairs = params.to_vec();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let message = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_sorts_parameters() {
        let a = sign(&[("timestamp", "1"), ("folder", "f")], "s3cr3t");
        let b = sign(&[("folder", "f"), ("timestamp", "1")], "s3cr3t");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_sign_matches_manual_digest() {
        let expected = hex::encode(Sha256::digest(b"folder=frenos&timestamp=1700000000abc"));
        assert_eq!(
            sign(&[("timestamp", "1700000000"), ("folder", "frenos")], "abc"),
            expected
        );
    }

    #[test]
    fn test_sign_depends_on_secret() {
        let params = [("timestamp", "1")];
        assert_ne!(sign(&params, "one"), sign(&params, "two"));
    }

    #[test]
    fn test_upload_url() {
        let client = MediaClient::new(MediaConfig {
            api_url: "https://media.test/v1_1/".to_string(),
            cloud_name: "frenos".to_string(),
            api_key: "key".to_string(),
            api_secret: secrecy::SecretString::from("s"),
        })
        .unwrap();
        assert_eq!(client.upload_url(), "https://media.test/v1_1/frenos/image/upload");
    }
}
