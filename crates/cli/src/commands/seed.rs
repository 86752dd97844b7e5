//! Seed the product table.
//!
//! # Usage
//!
//! ```bash
//! # Upsert the built-in catalog
//! frenos seed products
//!
//! # Load a JSON product list and drop everything else
//! frenos seed products --file productos.json --replace
//! ```

use std::path::Path;

use frenos_admin::db::{self, RepositoryError};
use frenos_core::{Catalog, CatalogError};
use thiserror::Error;

use super::DatabaseError;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid product list: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to write products: {0}")]
    Repository(#[from] RepositoryError),
}

/// Load the products to seed: the given JSON file or the built-in catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid product list.
pub fn load_catalog(file: Option<&Path>) -> Result<Catalog, SeedError> {
    match file {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
                path: path.display().to_string(),
                source,
            })?;
            Ok(Catalog::from_json(&json)?)
        }
        None => Ok(Catalog::builtin()?),
    }
}

/// Write products to the database.
///
/// With `replace`, the table is emptied first in the same transaction;
/// otherwise existing products with other ids are kept.
///
/// # Errors
///
/// Returns an error if loading the products or writing them fails.
pub async fn products(file: Option<&Path>, replace: bool) -> Result<usize, SeedError> {
    let catalog = load_catalog(file)?;
    let pool = super::connect().await?;

    let written = if replace {
        db::products::replace_all(&pool, catalog.products()).await?
    } else {
        for product in catalog.products() {
            db::products::upsert(&pool, product).await?;
        }
        catalog.products().len()
    };

    tracing::info!(products = written, replace, "Products seeded");
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_default() {
        let catalog = load_catalog(None).unwrap();
        assert!(!catalog.products().is_empty());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = load_catalog(Some(Path::new("/nonexistent/productos.json"))).unwrap_err();
        assert!(matches!(err, SeedError::Read { .. }));
    }

    #[test]
    fn test_file_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("productos.json");
        std::fs::write(
            &path,
            r#"[{"id":"d1","code":"DF-1","name":"Disco ventilado","brand":"Fremax",
                "model":"BD-1","compatibility":"Gol","price":"30000","category":"discos"}]"#,
        )
        .unwrap();

        let catalog = load_catalog(Some(&path)).unwrap();
        assert_eq!(catalog.products().len(), 1);
    }
}
