//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with
//! stricter security settings (SameSite=Strict, 24hr expiry).

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "frenos_admin_session";

/// Schema holding the admin session table.
pub const SESSION_SCHEMA: &str = "frenos_admin";

/// Session expiry time in seconds (24 hours - stricter than storefront).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// The session store identifiers were rejected.
#[derive(Debug, Error)]
#[error("invalid session store identifier: {0}")]
pub struct SessionStoreError(String);

/// The `PostgreSQL` session store for admin sessions.
///
/// The table is created by `frenos migrate`.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected.
pub fn session_store(pool: &PgPool) -> Result<PostgresStore, SessionStoreError> {
    PostgresStore::new(pool.clone())
        .with_schema_name(SESSION_SCHEMA)
        .map_err(|e| SessionStoreError(e.to_string()))?
        .with_table_name("session")
        .map_err(|e| SessionStoreError(e.to_string()))
}

/// Create the session layer over the given store.
///
/// # Arguments
///
/// * `store` - Session store (the `PostgreSQL` store in production)
/// * `config` - Admin configuration (for determining HTTPS mode)
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    config: &AdminConfig,
) -> SessionManagerLayer<S> {
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        // SameSite=Strict for admin (stricter than storefront's Lax)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
