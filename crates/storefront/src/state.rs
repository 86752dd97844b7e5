//! Application state shared across handlers.

use std::sync::Arc;

use frenos_core::CatalogError;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::{CatalogService, EmailClient, EmailError, TrackerHandle};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid built-in catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to create email client: {0}")]
    Email(#[from] EmailError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    catalog: CatalogService,
    tracker: TrackerHandle,
    email: Option<EmailClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool, if a database is configured
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in catalog is invalid or the email
    /// client cannot be built.
    pub fn new(config: StorefrontConfig, pool: Option<PgPool>) -> Result<Self, StateError> {
        let catalog = CatalogService::new(pool.clone())?;
        let tracker = TrackerHandle::new(&config.tracker_data_dir);
        let email = config
            .contact_email
            .as_ref()
            .map(EmailClient::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                tracker,
                email,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the database connection pool, if one is configured.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get the service tracker.
    #[must_use]
    pub fn tracker(&self) -> &TrackerHandle {
        &self.inner.tracker
    }

    /// Get the contact form email client, if configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailClient> {
        self.inner.email.as_ref()
    }
}
