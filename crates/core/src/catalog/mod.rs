//! Product catalog: the product record, the static product list, and lookups.
//!
//! The storefront reads products from the `products` table when one is
//! configured and falls back to the list embedded here. Both sources go
//! through [`augment`] before rendering so every product has an image.

mod category;
mod images;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ProductId;

pub use category::{CATEGORIES, Category};
pub use images::{CategoryImages, PLACEHOLDER_IMAGE, augment, needs_reseed, resolve_image};

/// Product list shipped with the binary.
const BUILTIN_PRODUCTS: &str = include_str!("../../data/products.json");

/// A brake part offered in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    /// Manufacturer part code.
    pub code: String,
    pub name: String,
    pub brand: String,
    /// Manufacturer model/reference of the part.
    pub model: String,
    /// Free text listing the vehicles the part fits.
    pub compatibility: String,
    pub price: Decimal,
    /// Category slug, see [`CATEGORIES`].
    pub category: String,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_on_sale: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
}

impl Product {
    /// Whether the sale price applies.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.is_on_sale == Some(true) && self.sale_price.is_some()
    }

    /// Price charged per unit: the sale price when on sale, else the list price.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        match self.sale_price {
            Some(sale) if self.is_on_sale == Some(true) => sale,
            _ => self.price,
        }
    }

    /// Lowercased text searched by [`Catalog::search`].
    fn haystack(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.name, self.code, self.brand, self.model, self.compatibility
        )
        .to_lowercase()
    }
}

/// Errors loading a product list.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The list is not valid JSON or a product is malformed.
    #[error("invalid product list: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two products share an id.
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),
}

/// An in-memory product list with the lookups the storefront needs.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Wrap an existing list.
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The product list embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded JSON is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_PRODUCTS)
    }

    /// Parse a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or two products share an id.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        let mut seen = std::collections::HashSet::new();
        for product in &products {
            if !seen.insert(&product.id) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self { products })
    }

    /// All products, in list order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Consume the catalog and return its products.
    #[must_use]
    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Case-insensitive lookup by part code.
    #[must_use]
    pub fn find_by_code(&self, code: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.code.eq_ignore_ascii_case(code.trim()))
    }

    /// Products flagged for the home page.
    pub fn featured(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_featured)
    }

    /// Products whose sale price currently applies.
    pub fn on_sale(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_discounted())
    }

    pub fn by_category<'a>(&'a self, slug: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products.iter().filter(move |p| p.category == slug)
    }

    /// Products matching every whitespace-separated term of `query`.
    ///
    /// Terms are matched case-insensitively against name, code, brand, model
    /// and compatibility. A blank query matches everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        self.products
            .iter()
            .filter(|p| {
                let haystack = p.haystack();
                terms.iter().all(|t| haystack.contains(t.as_str()))
            })
            .collect()
    }

    /// Categories from the master list that have at least one product.
    #[must_use]
    pub fn categories_in_use(&self) -> Vec<&'static Category> {
        CATEGORIES
            .iter()
            .filter(|c| self.products.iter().any(|p| p.category == c.slug))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_consistent() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        assert!(!needs_reseed(catalog.products()));
        assert!(catalog.featured().count() > 0);
    }

    #[test]
    fn effective_price_uses_sale_only_when_flagged() {
        let mut product = Catalog::builtin().unwrap().into_products().remove(0);
        product.price = Decimal::new(100, 0);
        product.sale_price = Some(Decimal::new(80, 0));

        product.is_on_sale = None;
        assert_eq!(product.effective_price(), Decimal::new(100, 0));

        product.is_on_sale = Some(true);
        assert_eq!(product.effective_price(), Decimal::new(80, 0));
        assert!(product.is_discounted());

        product.sale_price = None;
        assert_eq!(product.effective_price(), Decimal::new(100, 0));
        assert!(!product.is_discounted());
    }

    #[test]
    fn search_matches_all_terms_case_insensitively() {
        let catalog = Catalog::from_json(
            r#"[
                {"id":"a","code":"PF-100","name":"Pastilla delantera","brand":"Fras-le",
                 "model":"PD/100","compatibility":"VW Gol Trend","price":"1000","category":"pastillas"},
                {"id":"b","code":"DF-200","name":"Disco ventilado","brand":"Fremax",
                 "model":"BD-200","compatibility":"Ford Focus","price":2000,"category":"discos"}
            ]"#,
        )
        .unwrap();

        let ids: Vec<&str> = catalog.search("gol FRAS").iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
        assert_eq!(catalog.search("  ").len(), 2);
        assert!(catalog.search("corolla").is_empty());
        assert_eq!(catalog.find_by_code("df-200").map(|p| p.id.as_str()), Some("b"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Catalog::from_json(
            r#"[
                {"id":"a","code":"1","name":"x","brand":"b","model":"m","compatibility":"c","price":1,"category":"kits"},
                {"id":"a","code":"2","name":"y","brand":"b","model":"m","compatibility":"c","price":1,"category":"kits"}
            ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(_)));
    }

    #[test]
    fn categories_in_use_follow_master_order() {
        let catalog = Catalog::builtin().unwrap();
        let slugs: Vec<&str> = catalog.categories_in_use().iter().map(|c| c.slug).collect();
        let master: Vec<&str> = CATEGORIES
            .iter()
            .map(|c| c.slug)
            .filter(|s| slugs.contains(s))
            .collect();
        assert_eq!(slugs, master);
    }
}
