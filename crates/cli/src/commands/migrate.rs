//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! frenos migrate
//! ```
//!
//! Runs the SQL files in `crates/admin/migrations/` (schema `frenos`), then
//! creates the session tables: the storefront's in `tower_sessions` and the
//! admin panel's in `frenos_admin`.
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL` connection string

use std::path::Path;

use sqlx::migrate::Migrator;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use super::DatabaseError;

/// Directory holding the SQL migrations.
const MIGRATIONS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../admin/migrations");

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Session store error: {0}")]
    SessionStore(String),
}

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = super::connect().await?;

    tracing::info!(dir = MIGRATIONS_DIR, "Running migrations...");
    let migrator = Migrator::new(Path::new(MIGRATIONS_DIR)).await?;
    migrator.run(&pool).await?;

    tracing::info!("Creating storefront session table...");
    PostgresStore::new(pool.clone())
        .migrate()
        .await
        .map_err(|e| MigrationError::SessionStore(e.to_string()))?;

    tracing::info!("Creating admin session table...");
    frenos_admin::middleware::session_store(&pool)
        .map_err(|e| MigrationError::SessionStore(e.to_string()))?
        .migrate()
        .await
        .map_err(|e| MigrationError::SessionStore(e.to_string()))?;

    tracing::info!("Migrations complete!");
    Ok(())
}
