//! Cart route handlers.
//!
//! The cart lives in the visitor's session. The page renders server-side;
//! the JSON endpoints back the add/update/remove buttons.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Json, extract::State, response::IntoResponse};
use frenos_core::{Cart, Price, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use super::api::{self, ApiResponse};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{load_cart, save_cart};
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: String,
    pub code: String,
    pub name: String,
    pub image_url: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub unit_price_display: String,
    pub line_total_display: String,
}

/// Cart display data, for both the page and the JSON API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub total: Decimal,
    pub total_display: String,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let items = cart
            .lines()
            .iter()
            .map(|line| CartItemView {
                product_id: line.product.id.as_str().to_string(),
                code: line.product.code.clone(),
                name: line.product.name.clone(),
                image_url: line.product.image_url.clone().unwrap_or_default(),
                quantity: line.quantity,
                unit_price: line.unit_price(),
                line_total: line.line_total(),
                unit_price_display: Price::ars(line.unit_price()).display(),
                line_total_display: Price::ars(line.line_total()).display(),
            })
            .collect();

        Self {
            items,
            item_count: cart.item_count(),
            total: cart.total(),
            total_display: Price::ars(cart.total()).display(),
        }
    }
}

/// Add to cart request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove line request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;
    Ok(CartShowTemplate {
        cart: CartView::from(&cart),
    })
}

/// Current cart as JSON.
#[instrument(skip(session))]
pub async fn summary(session: Session) -> Result<Json<ApiResponse<CartView>>> {
    let cart = load_cart(&session).await?;
    Ok(api::data(CartView::from(&cart)))
}

/// Add a product to the cart.
///
/// The product is re-read from the catalog so the line carries current
/// prices. Adding a product already in the cart increments its quantity.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<ApiResponse<CartView>>> {
    let quantity = req.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest(
            "La cantidad debe ser al menos 1".to_string(),
        ));
    }

    let catalog = state.catalog().catalog().await;
    let product = catalog
        .find(&req.product_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Producto no encontrado".to_string()))?;
    let name = product.name.clone();

    let mut cart = load_cart(&session).await?;
    cart.add(product, quantity);
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product", req.product_id.as_str())][..]),
    );
    Ok(api::done(
        format!("{name} agregado al carrito"),
        CartView::from(&cart),
    ))
}

/// Set a line's quantity. Zero removes the line.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Json(req): Json<UpdateCartRequest>,
) -> Result<Json<ApiResponse<CartView>>> {
    let mut cart = load_cart(&session).await?;
    if !cart.update_quantity(&req.product_id, req.quantity) {
        return Err(AppError::NotFound(
            "El producto no está en el carrito".to_string(),
        ));
    }
    save_cart(&session, &cart).await?;

    let message = if req.quantity == 0 {
        "Producto eliminado del carrito"
    } else {
        "Carrito actualizado"
    };
    Ok(api::done(message, CartView::from(&cart)))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Json(req): Json<RemoveFromCartRequest>,
) -> Result<Json<ApiResponse<CartView>>> {
    let mut cart = load_cart(&session).await?;
    if !cart.remove(&req.product_id) {
        return Err(AppError::NotFound(
            "El producto no está en el carrito".to_string(),
        ));
    }
    save_cart(&session, &cart).await?;
    Ok(api::done("Producto eliminado del carrito", CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<ApiResponse<CartView>>> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(api::done("Carrito vaciado", CartView::from(&cart)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frenos_core::Catalog;

    use super::*;

    #[test]
    fn test_cart_view_totals() {
        let catalog = Catalog::builtin().unwrap();
        let mut cart = Cart::new();
        let first = catalog.products().first().cloned().unwrap();
        cart.add(first.clone(), 3);

        let view = CartView::from(&cart);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.total, first.effective_price() * Decimal::from(3));
        assert_eq!(view.total_display, Price::ars(view.total).display());
    }

    #[test]
    fn test_cart_view_serializes_camel_case() {
        let view = CartView::from(&Cart::new());
        let value = serde_json::to_value(view).unwrap();
        assert_eq!(value["itemCount"], 0);
        assert!(value["items"].as_array().unwrap().is_empty());
    }
}
