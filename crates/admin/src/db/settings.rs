//! Key-value settings table.
//!
//! Values are arbitrary JSON. The storefront reads `category_images` from
//! here; other keys are free for the admin to use.

use serde_json::Value as JsonValue;
use sqlx::PgPool;

use super::RepositoryError;

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

/// Set a setting value (upsert).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn set_setting(pool: &PgPool, key: &str, value: &JsonValue) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO frenos.settings (key, value, updated_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (key) DO UPDATE SET
            value = EXCLUDED.value,
            updated_at = NOW()
        ",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a setting. Returns whether it existed.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn delete_setting(pool: &PgPool, key: &str) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM frenos.settings WHERE key = $1")
        .bind(key)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
