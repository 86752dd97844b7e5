//! Settings table reads.

use frenos_core::catalog::CategoryImages;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use super::RepositoryError;

/// Setting holding per-category image overrides: `{"discos": "/uploads/x.jpg"}`.
pub const CATEGORY_IMAGES_KEY: &str = "category_images";

/// Get a setting value.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn get_setting(pool: &PgPool, key: &str) -> Result<Option<JsonValue>, RepositoryError> {
    let value = sqlx::query_scalar::<_, JsonValue>(
        r"
        SELECT value FROM frenos.settings
        WHERE key = $1
        ",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(value)
}

/// Category image overrides; empty when unset.
///
/// # Errors
///
/// Returns an error if the query fails or the stored value is not a map of
/// strings.
pub async fn category_images(pool: &PgPool) -> Result<CategoryImages, RepositoryError> {
    match get_setting(pool, CATEGORY_IMAGES_KEY).await? {
        None => Ok(CategoryImages::new()),
        Some(value) => serde_json::from_value(value).map_err(|e| {
            RepositoryError::DataCorruption(format!("{CATEGORY_IMAGES_KEY}: {e}"))
        }),
    }
}
