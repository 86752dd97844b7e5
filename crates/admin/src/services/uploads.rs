//! Image upload checks and local storage.
//!
//! Local uploads land in `UPLOAD_DIR`, which the storefront serves under
//! `/uploads`. Stored names are `<uuid>-<sanitized original stem>.<ext>`,
//! with the extension taken from the content type so the file is always
//! served as the raster image it was accepted as.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Public URL prefix for local uploads.
pub const PUBLIC_PREFIX: &str = "/uploads";

const MAX_NAME_LEN: usize = 80;

/// Accepted content types and the extension each is stored with. SVG is
/// not accepted: it can carry script.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("image/avif", "avif"),
];

/// Rejected or failed uploads.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file in the request")]
    MissingFile,

    #[error("unsupported content type: {0}")]
    NotAnImage(String),

    #[error("file too large: {0} bytes")]
    TooLarge(usize),

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// An accepted image, ready to store.
#[derive(Debug)]
pub struct ImageUpload {
    /// Sanitized name prefixed with a UUID.
    pub stored_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Validate an uploaded file.
    ///
    /// # Errors
    ///
    /// Rejects anything but PNG, JPEG, WebP, GIF and AVIF, and files over
    /// [`MAX_UPLOAD_BYTES`].
    pub fn new(
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self, UploadError> {
        let content_type = content_type.unwrap_or_default().trim().to_ascii_lowercase();
        let Some(&(_, extension)) = IMAGE_TYPES.iter().find(|(t, _)| *t == content_type) else {
            return Err(UploadError::NotAnImage(content_type));
        };
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge(bytes.len()));
        }

        let name = sanitize_file_name(file_name.unwrap_or_default());
        let stem = Path::new(&name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("imagen");
        let stored_name = format!("{}-{stem}.{extension}", Uuid::new_v4());

        Ok(Self {
            stored_name,
            content_type,
            bytes,
        })
    }

    /// Stored name without its extension, used as the media service id.
    #[must_use]
    pub fn stem(&self) -> &str {
        Path::new(&self.stored_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.stored_name)
    }
}

/// Reduce a client-supplied file name to `[a-z0-9._-]`, with no path parts.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut cleaned = String::with_capacity(base.len());
    for c in base.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
            cleaned.push(c);
        } else if !cleaned.ends_with('-') {
            cleaned.push('-');
        }
    }

    let cleaned: String = cleaned
        .trim_matches(|c| c == '.' || c == '-')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();

    if cleaned.is_empty() {
        "imagen".to_string()
    } else {
        cleaned
    }
}

/// Write an upload into `dir`, creating it when needed.
///
/// Returns the path written and the public URL.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub async fn store_local(dir: &Path, upload: &ImageUpload) -> Result<(PathBuf, String), UploadError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&upload.stored_name);
    tokio::fs::write(&path, &upload.bytes).await?;

    tracing::info!(path = %path.display(), size = upload.bytes.len(), "Image stored locally");
    Ok((path, format!("{PUBLIC_PREFIX}/{}", upload.stored_name)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_paths_and_symbols() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\fotos\\Disco Freno.JPG"), "disco-freno.jpg");
        assert_eq!(sanitize_file_name("pastilla (1).png"), "pastilla-1-.png");
        assert_eq!(sanitize_file_name("..."), "imagen");
        assert_eq!(sanitize_file_name(""), "imagen");
    }

    #[test]
    fn test_sanitize_limits_length() {
        let long = format!("{}.png", "a".repeat(200));
        assert_eq!(sanitize_file_name(&long).len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_rejects_non_images() {
        let err = ImageUpload::new(Some("x.pdf"), Some("application/pdf"), vec![1]).unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage(_)));

        let err = ImageUpload::new(Some("x.png"), None, vec![1]).unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage(_)));
    }

    #[test]
    fn test_rejects_svg() {
        let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(1)</script></svg>";
        let err =
            ImageUpload::new(Some("logo.svg"), Some("image/svg+xml"), svg.to_vec()).unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage(_)));
    }

    #[test]
    fn test_extension_follows_content_type() {
        let upload = ImageUpload::new(Some("pagina.html"), Some("image/png"), vec![1]).unwrap();
        assert!(upload.stored_name.ends_with("-pagina.png"));

        let upload = ImageUpload::new(Some("Foto.JPEG"), Some("image/jpeg"), vec![1]).unwrap();
        assert!(upload.stored_name.ends_with("-foto.jpg"));

        let upload = ImageUpload::new(None, Some("image/webp"), vec![1]).unwrap();
        assert!(upload.stored_name.ends_with("-imagen.webp"));
    }

    #[test]
    fn test_rejects_large_files() {
        let bytes = vec![0; MAX_UPLOAD_BYTES + 1];
        let err = ImageUpload::new(Some("x.png"), Some("image/png"), bytes).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge(_)));
    }

    #[test]
    fn test_stored_name_is_prefixed() {
        let upload = ImageUpload::new(Some("Disco.PNG"), Some("image/png"), vec![1, 2]).unwrap();
        assert!(upload.stored_name.ends_with("-disco.png"));
        assert_eq!(upload.stored_name.len(), 36 + 1 + "disco.png".len());
        assert!(upload.stem().ends_with("-disco"));
    }

    #[tokio::test]
    async fn test_store_local_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let upload = ImageUpload::new(Some("a.webp"), Some("image/webp"), vec![7; 16]).unwrap();

        let (path, url) = store_local(&dir.path().join("nested"), &upload).await.unwrap();

        assert_eq!(std::fs::read(path).unwrap(), vec![7; 16]);
        assert_eq!(url, format!("/uploads/{}", upload.stored_name));
    }
}
