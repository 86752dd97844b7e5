//! Product catalog source with caching.
//!
//! Products come from the `products` table when a database is configured and
//! the stored list is usable, otherwise from the list embedded in
//! `frenos-core`. Either way images are resolved before the catalog is cached
//! (60 second TTL), so templates can rely on `image_url` being set.

use std::sync::Arc;
use std::time::Duration;

use frenos_core::catalog::{self, CategoryImages};
use frenos_core::{Catalog, CatalogError};
use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use crate::db;

const CACHE_KEY: &str = "catalog";
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Cached access to the current catalog.
#[derive(Clone)]
pub struct CatalogService {
    pool: Option<PgPool>,
    builtin: Arc<Catalog>,
    cache: Cache<&'static str, Arc<Catalog>>,
}

impl CatalogService {
    /// Create the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded product list is malformed.
    pub fn new(pool: Option<PgPool>) -> Result<Self, CatalogError> {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            pool,
            builtin: Arc::new(Catalog::builtin()?),
            cache,
        })
    }

    /// The current catalog. Never fails: database problems fall back to the
    /// static list.
    pub async fn catalog(&self) -> Arc<Catalog> {
        self.cache.get_with(CACHE_KEY, self.load()).await
    }

    /// Drop the cached catalog so the next request reloads it.
    pub async fn invalidate(&self) {
        self.cache.invalidate(CACHE_KEY).await;
    }

    #[instrument(skip(self))]
    async fn load(&self) -> Arc<Catalog> {
        let Some(pool) = &self.pool else {
            return self.static_catalog(&CategoryImages::new());
        };

        let overrides = db::settings::category_images(pool)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load category images, using defaults");
                CategoryImages::new()
            });

        match db::products::list(pool).await {
            Ok(products) if !catalog::needs_reseed(&products) => {
                debug!(count = products.len(), "Loaded catalog from database");
                Arc::new(Catalog::new(catalog::augment(products, &overrides)))
            }
            Ok(products) => {
                warn!(
                    count = products.len(),
                    "Stored catalog is empty or outdated, serving static catalog"
                );
                self.static_catalog(&overrides)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load products, serving static catalog");
                self.static_catalog(&overrides)
            }
        }
    }

    fn static_catalog(&self, overrides: &CategoryImages) -> Arc<Catalog> {
        let products = self.builtin.products().to_vec();
        Arc::new(Catalog::new(catalog::augment(products, overrides)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn without_database_serves_augmented_static_catalog() {
        let service = CatalogService::new(None).unwrap();
        let catalog = service.catalog().await;

        assert_eq!(catalog.len(), Catalog::builtin().unwrap().len());
        assert!(catalog.products().iter().all(|p| p.image_url.is_some()));
    }

    #[tokio::test]
    async fn catalog_is_cached_until_invalidated() {
        let service = CatalogService::new(None).unwrap();
        let first = service.catalog().await;
        let second = service.catalog().await;
        assert!(Arc::ptr_eq(&first, &second));

        service.invalidate().await;
        let third = service.catalog().await;
        assert!(!Arc::ptr_eq(&first, &third));
    }
}
