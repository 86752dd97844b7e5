//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use frenos_core::catalog::Category;
use frenos_core::{Price, Product, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::whatsapp;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub code: String,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub compatibility: String,
    pub category: String,
    pub category_name: String,
    pub image_url: String,
    pub price: String,
    /// List price shown struck through when the product is on sale.
    pub compare_at_price: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_str().to_string(),
            code: product.code.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            model: product.model.clone(),
            compatibility: product.compatibility.clone(),
            category: product.category.clone(),
            category_name: Category::display_name(&product.category).to_string(),
            image_url: product.image_url.clone().unwrap_or_default(),
            price: Price::ars(product.effective_price()).display(),
            compare_at_price: product
                .is_discounted()
                .then(|| Price::ars(product.price).display()),
        }
    }
}

/// Category filter link for templates.
#[derive(Clone)]
pub struct CategoryLink {
    pub slug: &'static str,
    pub name: &'static str,
    pub active: bool,
}

/// Catalog filters.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub categories: Vec<CategoryLink>,
    pub category_selected: bool,
    pub query: String,
    pub heading: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub related_products: Vec<ProductView>,
}

/// Display product listing page.
///
/// `?category=` narrows to one category, `?q=` searches name, code, brand,
/// model and compatibility. Both may be combined.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let catalog = state.catalog().catalog().await;

    let category = query
        .category
        .as_deref()
        .filter(|slug| Category::is_known(slug));
    let search = query.q.as_deref().map(str::trim).unwrap_or_default();

    let products = catalog
        .search(search)
        .into_iter()
        .filter(|p| category.is_none_or(|slug| p.category == slug))
        .map(ProductView::from)
        .collect();

    let categories = catalog
        .categories_in_use()
        .into_iter()
        .map(|c| CategoryLink {
            slug: c.slug,
            name: c.name,
            active: category == Some(c.slug),
        })
        .collect();

    let heading = category.map_or("Todos los productos", Category::display_name);

    ProductsIndexTemplate {
        products,
        categories,
        category_selected: category.is_some(),
        query: search.to_string(),
        heading: heading.to_string(),
    }
}

/// Display product detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let catalog = state.catalog().catalog().await;
    let product = catalog
        .find(&ProductId::new(id))
        .ok_or_else(|| AppError::NotFound("Producto no encontrado".to_string()))?;

    let related_products = catalog
        .by_category(&product.category)
        .filter(|p| p.id != product.id)
        .take(4)
        .map(ProductView::from)
        .collect();

    Ok(ProductShowTemplate {
        product: ProductView::from(product),
        related_products,
    })
}

/// Redirect to WhatsApp with a question about one product.
#[instrument(skip(state))]
pub async fn inquiry(State(state): State<AppState>, Path(id): Path<String>) -> Result<Redirect> {
    let catalog = state.catalog().catalog().await;
    let product = catalog
        .find(&ProductId::new(id))
        .ok_or_else(|| AppError::NotFound("Producto no encontrado".to_string()))?;

    let number = whatsapp::store_number(
        &state.config().settings_file,
        state.config().whatsapp_number.as_deref(),
    )
    .await?;
    let message = whatsapp::inquiry_message(product)?;

    Ok(Redirect::to(&whatsapp::link(&number, &message)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frenos_core::Catalog;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_view_shows_sale_price_and_list_price() {
        let mut product = Catalog::builtin().unwrap().products().first().cloned().unwrap();
        product.price = Decimal::new(10_000, 0);
        product.is_on_sale = Some(true);
        product.sale_price = Some(Decimal::new(8_000, 0));

        let view = ProductView::from(&product);
        assert_eq!(view.price, Price::ars(Decimal::new(8_000, 0)).display());
        assert_eq!(
            view.compare_at_price,
            Some(Price::ars(Decimal::new(10_000, 0)).display())
        );
    }

    #[test]
    fn test_view_without_sale_has_no_compare_price() {
        let mut product = Catalog::builtin().unwrap().products().first().cloned().unwrap();
        product.is_on_sale = None;
        product.sale_price = None;
        assert!(ProductView::from(&product).compare_at_price.is_none());
    }
}
