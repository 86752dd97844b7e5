//! Product writes and reads for the catalog editor.

use frenos_core::{Product, ProductId};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    code: String,
    name: String,
    brand: String,
    model: String,
    compatibility: String,
    price: Decimal,
    category: String,
    is_featured: bool,
    image_url: Option<String>,
    is_on_sale: Option<bool>,
    sale_price: Option<Decimal>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            brand: row.brand,
            model: row.model,
            compatibility: row.compatibility,
            price: row.price,
            category: row.category,
            is_featured: row.is_featured,
            image_url: row.image_url,
            is_on_sale: row.is_on_sale,
            sale_price: row.sale_price,
        }
    }
}

/// All products, ordered by category then name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list(pool: &PgPool) -> Result<Vec<Product>, RepositoryError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        r"
        SELECT id, code, name, brand, model, compatibility, price, category,
               is_featured, image_url, is_on_sale, sale_price
        FROM frenos.products
        ORDER BY category, name
        ",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Product::from).collect())
}

/// One product by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn get(pool: &PgPool, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(
        r"
        SELECT id, code, name, brand, model, compatibility, price, category,
               is_featured, image_url, is_on_sale, sale_price
        FROM frenos.products
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Product::from))
}

/// Insert a product, or replace every column of the row with the same id.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub async fn upsert<'e>(
    executor: impl PgExecutor<'e>,
    product: &Product,
) -> Result<Product, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(
        r"
        INSERT INTO frenos.products
            (id, code, name, brand, model, compatibility, price, category,
             is_featured, image_url, is_on_sale, sale_price)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO UPDATE SET
            code = EXCLUDED.code,
            name = EXCLUDED.name,
            brand = EXCLUDED.brand,
            model = EXCLUDED.model,
            compatibility = EXCLUDED.compatibility,
            price = EXCLUDED.price,
            category = EXCLUDED.category,
            is_featured = EXCLUDED.is_featured,
            image_url = EXCLUDED.image_url,
            is_on_sale = EXCLUDED.is_on_sale,
            sale_price = EXCLUDED.sale_price,
            updated_at = NOW()
        RETURNING id, code, name, brand, model, compatibility, price, category,
                  is_featured, image_url, is_on_sale, sale_price
        ",
    )
    .bind(&product.id)
    .bind(&product.code)
    .bind(&product.name)
    .bind(&product.brand)
    .bind(&product.model)
    .bind(&product.compatibility)
    .bind(product.price)
    .bind(&product.category)
    .bind(product.is_featured)
    .bind(&product.image_url)
    .bind(product.is_on_sale)
    .bind(product.sale_price)
    .fetch_one(executor)
    .await?;

    Ok(row.into())
}

/// Delete a product. Returns whether a row was removed.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub async fn delete(pool: &PgPool, id: &ProductId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM frenos.products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Replace the whole table with `products` in one transaction.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns an error if any statement fails; the table is left unchanged.
pub async fn replace_all(pool: &PgPool, products: &[Product]) -> Result<usize, RepositoryError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM frenos.products")
        .execute(&mut *tx)
        .await?;

    for product in products {
        upsert(&mut *tx, product).await?;
    }

    tx.commit().await?;
    Ok(products.len())
}

