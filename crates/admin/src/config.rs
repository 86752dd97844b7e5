//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` connection string
//! - `ADMIN_PASSWORD_HASH` - Argon2 PHC string for the admin password
//!   (generate with `frenos admin hash-password`)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_BASE_URL` - Public URL for the admin panel (default: <http://localhost:3001>)
//! - `SETTINGS_FILE` - `KEY=value` settings file (default: .env.local)
//! - `UPLOAD_DIR` - Local image uploads, shared with the storefront (default: public/uploads)
//! - `STATIC_DIR` - Static assets served under `/static` (default: crates/admin/static)
//! - `SMTP_PASSWORD` - SMTP password. Host, port, username and sender are read
//!   from the settings file on each send, falling back to `SMTP_*` variables.
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Sentry error tracking
//!
//! ## Optional (hosted media - enables `/api/uploads/media`)
//! - `CLOUDINARY_CLOUD_NAME` - Account cloud name
//! - `CLOUDINARY_API_KEY` - API key
//! - `CLOUDINARY_API_SECRET` - API secret used to sign uploads
//! - `CLOUDINARY_API_URL` - API base URL (default: <https://api.cloudinary.com/v1_1>)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use argon2::PasswordHash;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_MEDIA_API_URL: &str = "https://api.cloudinary.com/v1_1";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Argon2 hash of the admin password
    pub password_hash: SecretString,
    /// Settings file shared with the storefront
    pub settings_file: PathBuf,
    /// Directory receiving local uploads
    pub upload_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// SMTP password; the rest of the SMTP settings live in the settings file
    pub smtp_password: Option<SecretString>,
    /// Hosted media service (optional)
    pub media: Option<MediaConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Hosted media service configuration.
///
/// Implements `Debug` manually to redact the API secret.
#[derive(Clone)]
pub struct MediaConfig {
    /// API base URL
    pub api_url: String,
    /// Account cloud name
    pub cloud_name: String,
    /// API key sent with each upload
    pub api_key: String,
    /// Secret used to sign uploads
    pub api_secret: SecretString,
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("api_url", &self.api_url)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl MediaConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cloud_name = get_optional_env("CLOUDINARY_CLOUD_NAME");
        let api_key = get_optional_env("CLOUDINARY_API_KEY");
        let api_secret = get_optional_env("CLOUDINARY_API_SECRET");

        match (cloud_name, api_key, api_secret) {
            (Some(cloud_name), Some(api_key), Some(secret)) => {
                validate_secret_strength(&secret, "CLOUDINARY_API_SECRET")?;
                Ok(Some(Self {
                    api_url: get_env_or_default("CLOUDINARY_API_URL", DEFAULT_MEDIA_API_URL),
                    cloud_name,
                    api_key,
                    api_secret: SecretString::from(secret),
                }))
            }
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "CLOUDINARY_*".to_string(),
                "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set together"
                    .to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("ADMIN_BASE_URL", "http://localhost:3001");
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("ADMIN_BASE_URL".to_string(), e.to_string())
        })?;
        let password_hash = get_required_secret("ADMIN_PASSWORD_HASH")?;
        validate_password_hash(&password_hash, "ADMIN_PASSWORD_HASH")?;

        let media = MediaConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            password_hash,
            settings_file: get_env_or_default("SETTINGS_FILE", ".env.local").into(),
            upload_dir: get_env_or_default("UPLOAD_DIR", "public/uploads").into(),
            static_dir: get_env_or_default("STATIC_DIR", "crates/admin/static").into(),
            smtp_password: get_optional_env("SMTP_PASSWORD").map(SecretString::from),
            media,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns a reference to the hosted media configuration, if available.
    ///
    /// Returns `None` if the `CLOUDINARY_*` variables are not set, which
    /// disables media uploads.
    #[must_use]
    pub const fn media(&self) -> Option<&MediaConfig> {
        self.media.as_ref()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the password hash is a PHC string argon2 can verify against.
fn validate_password_hash(hash: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    PasswordHash::new(hash.expose_secret()).map_err(|e| {
        ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("not a PHC password hash ({e}); run `frenos admin hash-password`"),
        )
    })?;
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    const TEST_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$Xk6SWDIQfbJdZ1WqLf3B6e4lC7d0yXy8bbk0jGDd0x4";

    pub(crate) fn test_config() -> AdminConfig {
        AdminConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            password_hash: SecretString::from(TEST_HASH),
            settings_file: ".env.local".into(),
            upload_dir: "public/uploads".into(),
            static_dir: "crates/admin/static".into(),
            smtp_password: None,
            media: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-api-secret-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let err = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_password_hash_must_be_phc() {
        let plain = SecretString::from("hunter2");
        assert!(matches!(
            validate_password_hash(&plain, "ADMIN_PASSWORD_HASH"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));

        let phc = SecretString::from(TEST_HASH);
        assert!(validate_password_hash(&phc, "ADMIN_PASSWORD_HASH").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
    }

    #[test]
    fn test_media_config_debug_redacts_secrets() {
        let config = MediaConfig {
            api_url: DEFAULT_MEDIA_API_URL.to_string(),
            cloud_name: "frenos".to_string(),
            api_key: "123456789".to_string(),
            api_secret: SecretString::from("super_secret_media_key"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("frenos"));
        assert!(debug_output.contains("123456789"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_media_key"));
    }
}
