//! Product reads.

use frenos_core::{Product, ProductId};
use rust_decimal::Decimal;
use sqlx::PgPool;

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

/// All stored products, ordered by category then name.
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
