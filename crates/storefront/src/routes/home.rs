//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::products::{CategoryLink, ProductView};
use crate::state::AppState;

/// Most featured products shown on the home page.
const FEATURED_LIMIT: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured: Vec<ProductView>,
    pub on_sale: Vec<ProductView>,
    pub categories: Vec<CategoryLink>,
}

/// Display the home page: featured products, current offers and the
/// category grid.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.catalog().catalog().await;

    HomeTemplate {
        featured: catalog
            .featured()
            .take(FEATURED_LIMIT)
            .map(ProductView::from)
            .collect(),
        on_sale: catalog
            .on_sale()
            .take(FEATURED_LIMIT)
            .map(ProductView::from)
            .collect(),
        categories: catalog
            .categories_in_use()
            .into_iter()
            .map(|c| CategoryLink {
                slug: c.slug,
                name: c.name,
                active: false,
            })
            .collect(),
    }
}
