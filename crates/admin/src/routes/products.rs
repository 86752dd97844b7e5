//! Product catalog editor.
//!
//! Writes go straight to `frenos.products`. The storefront caches its
//! catalog for a minute, so edits show up there within that window.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, State},
};
use frenos_core::catalog::{CATEGORIES, Category};
use frenos_core::{Catalog, Price, Product, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::api::{self, ApiResponse};
use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Product row for the admin table.
pub struct ProductRowView {
    pub id: String,
    pub code: String,
    pub name: String,
    pub brand: String,
    pub category_name: String,
    pub price: String,
    pub sale_price: Option<String>,
    pub is_featured: bool,
    pub image_url: String,
}

impl From<&Product> for ProductRowView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_str().to_string(),
            code: product.code.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            category_name: Category::display_name(&product.category).to_string(),
            price: Price::ars(product.price).display(),
            sale_price: product
                .is_discounted()
                .then(|| Price::ars(product.effective_price()).display()),
            is_featured: product.is_featured,
            image_url: product.image_url.clone().unwrap_or_default(),
        }
    }
}

/// Products page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductRowView>,
    pub categories: &'static [Category],
    pub current_path: &'static str,
}

/// Product fields sent by the editor. The id is optional on create.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(default)]
    pub id: Option<ProductId>,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub compatibility: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_on_sale: Option<bool>,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
}

impl ProductInput {
    /// Validate and build the product stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BadRequest`] with a message for the editor.
    pub fn into_product(self, id: ProductId) -> Result<Product> {
        let code = self.code.trim().to_string();
        let name = self.name.trim().to_string();
        let category = self.category.trim().to_string();

        if code.is_empty() {
            return Err(AppError::BadRequest("El código es obligatorio".to_string()));
        }
        if name.is_empty() {
            return Err(AppError::BadRequest("El nombre es obligatorio".to_string()));
        }
        if !Category::is_known(&category) {
            return Err(AppError::BadRequest(format!(
                "Categoría desconocida: {category}"
            )));
        }
        if self.price.is_sign_negative() {
            return Err(AppError::BadRequest(
                "El precio no puede ser negativo".to_string(),
            ));
        }
        if let Some(sale) = self.sale_price
            && (sale.is_sign_negative() || sale >= self.price)
        {
            return Err(AppError::BadRequest(
                "El precio de oferta debe ser menor al precio de lista".to_string(),
            ));
        }
        if self.is_on_sale == Some(true) && self.sale_price.is_none() {
            return Err(AppError::BadRequest(
                "Falta el precio de oferta".to_string(),
            ));
        }

        Ok(Product {
            id,
            code,
            name,
            brand: self.brand.trim().to_string(),
            model: self.model.trim().to_string(),
            compatibility: self.compatibility.trim().to_string(),
            price: self.price,
            category,
            is_featured: self.is_featured,
            image_url: self
                .image_url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            is_on_sale: self.is_on_sale,
            sale_price: self.sale_price,
        })
    }
}

/// Rows written by a reseed.
#[derive(Debug, Serialize)]
pub struct ReseedSummary {
    pub products: usize,
}

/// Products table page.
///
/// GET /products
#[instrument(skip(_admin, state))]
pub async fn index(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<ProductsIndexTemplate> {
    let products = db::products::list(state.pool()).await?;

    Ok(ProductsIndexTemplate {
        products: products.iter().map(ProductRowView::from).collect(),
        categories: CATEGORIES,
        current_path: "/products",
    })
}

/// GET /api/products
#[instrument(skip(_admin, state))]
pub async fn list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let products = db::products::list(state.pool()).await?;
    Ok(api::data(products))
}

/// Create a product, generating an id when none is given.
///
/// POST /api/products
#[instrument(skip(_admin, state, input))]
pub async fn create(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ApiResponse<Product>>> {
    let id = input.id.clone().unwrap_or_else(ProductId::generate);
    let product = input.into_product(id)?;

    if db::products::get(state.pool(), &product.id).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "Ya existe un producto con id {}",
            product.id
        )));
    }

    let saved = db::products::upsert(state.pool(), &product).await?;
    tracing::info!(product_id = %saved.id, "Product created");
    Ok(api::done("Producto creado", saved))
}

/// Replace a product's fields, inserting it when missing.
///
/// PUT /api/products/{id}
#[instrument(skip(_admin, state, input))]
pub async fn update(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ApiResponse<Product>>> {
    let product = input.into_product(id)?;
    let saved = db::products::upsert(state.pool(), &product).await?;
    tracing::info!(product_id = %saved.id, "Product saved");
    Ok(api::done("Producto guardado", saved))
}

/// DELETE /api/products/{id}
#[instrument(skip(_admin, state))]
pub async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<()>>> {
    if !db::products::delete(state.pool(), &id).await? {
        return Err(AppError::NotFound("Producto no encontrado".to_string()));
    }
    tracing::info!(product_id = %id, "Product deleted");
    Ok(api::ok("Producto eliminado"))
}

/// Replace the table with the built-in catalog.
///
/// POST /api/products/reseed
#[instrument(skip(_admin, state))]
pub async fn reseed(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReseedSummary>>> {
    let catalog = Catalog::builtin()?;
    let products = db::products::replace_all(state.pool(), catalog.products()).await?;
    tracing::info!(products, "Product table reseeded from the built-in catalog");
    Ok(api::done(
        "Catálogo restablecido",
        ReseedSummary { products },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn input() -> ProductInput {
        serde_json::from_value(serde_json::json!({
            "code": " PF-100 ",
            "name": "Pastilla delantera",
            "brand": "Fras-le",
            "price": "12500.00",
            "category": "pastillas",
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_input_is_trimmed() {
        let product = input().into_product(ProductId::new("p1")).unwrap();
        assert_eq!(product.code, "PF-100");
        assert_eq!(product.id.as_str(), "p1");
        assert!(!product.is_featured);
        assert_eq!(product.image_url, None);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut bad = input();
        bad.category = "llantas".to_string();
        assert!(matches!(
            bad.into_product(ProductId::new("p1")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_sale_price_must_be_lower() {
        let mut bad = input();
        bad.is_on_sale = Some(true);
        bad.sale_price = Some(dec("13000"));
        assert!(bad.into_product(ProductId::new("p1")).is_err());

        let mut good = input();
        good.is_on_sale = Some(true);
        good.sale_price = Some(dec("11000"));
        let product = good.into_product(ProductId::new("p1")).unwrap();
        assert!(product.is_discounted());
    }

    #[test]
    fn test_on_sale_needs_sale_price() {
        let mut bad = input();
        bad.is_on_sale = Some(true);
        assert!(bad.into_product(ProductId::new("p1")).is_err());
    }

    #[test]
    fn test_row_view_formats_prices() {
        let mut good = input();
        good.is_on_sale = Some(true);
        good.sale_price = Some(dec("11000"));
        let product = good.into_product(ProductId::new("p1")).unwrap();

        let row = ProductRowView::from(&product);
        assert_eq!(row.price, "$ 12.500,00");
        assert_eq!(row.sale_price.as_deref(), Some("$ 11.000,00"));
    }
}
