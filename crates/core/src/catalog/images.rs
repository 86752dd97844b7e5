//! Product image resolution and catalog consistency checks.

use std::collections::HashMap;

use super::{Category, Product};

/// Image shown when neither the product nor its category has one.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.svg";

/// Per-category image overrides keyed by category slug, as stored in the
/// `category_images` setting.
pub type CategoryImages = HashMap<String, String>;

/// Pick the image to show for a product.
///
/// Precedence: the product's own non-blank `image_url`, then the category
/// override, then the category's built-in default, then the placeholder.
#[must_use]
pub fn resolve_image(product: &Product, overrides: &CategoryImages) -> String {
    if let Some(url) = product.image_url.as_deref().map(str::trim)
        && !url.is_empty()
    {
        return url.to_owned();
    }

    if let Some(url) = overrides
        .get(&product.category)
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
    {
        return url.to_owned();
    }

    Category::find(&product.category).map_or_else(
        || PLACEHOLDER_IMAGE.to_owned(),
        |c| c.default_image.to_owned(),
    )
}

/// Fill in `image_url` on every product using [`resolve_image`].
#[must_use]
pub fn augment(products: Vec<Product>, overrides: &CategoryImages) -> Vec<Product> {
    products
        .into_iter()
        .map(|mut product| {
            product.image_url = Some(resolve_image(&product, overrides));
            product
        })
        .collect()
}

/// Whether a stored product list should be replaced by the static catalog.
///
/// True when the list is empty or when any product uses a category missing
/// from the master list (the list predates a category change).
#[must_use]
pub fn needs_reseed(stored: &[Product]) -> bool {
    stored.is_empty() || stored.iter().any(|p| !Category::is_known(&p.category))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::ProductId;

    fn product(category: &str, image_url: Option<&str>) -> Product {
        Product {
            id: ProductId::new("p1"),
            code: "PF-1".to_owned(),
            name: "Pastilla".to_owned(),
            brand: "Fras-le".to_owned(),
            model: "PD/123".to_owned(),
            compatibility: "Gol Trend".to_owned(),
            price: Decimal::new(10_000, 0),
            category: category.to_owned(),
            is_featured: false,
            image_url: image_url.map(str::to_owned),
            is_on_sale: None,
            sale_price: None,
        }
    }

    #[test]
    fn explicit_image_wins() {
        let mut overrides = CategoryImages::new();
        overrides.insert("pastillas".to_owned(), "/custom.jpg".to_owned());
        let p = product("pastillas", Some("/mine.jpg"));
        assert_eq!(resolve_image(&p, &overrides), "/mine.jpg");
    }

    #[test]
    fn blank_image_falls_through_to_override() {
        let mut overrides = CategoryImages::new();
        overrides.insert("pastillas".to_owned(), "/custom.jpg".to_owned());
        let p = product("pastillas", Some("  "));
        assert_eq!(resolve_image(&p, &overrides), "/custom.jpg");
    }

    #[test]
    fn category_default_then_placeholder() {
        let overrides = CategoryImages::new();
        assert_eq!(
            resolve_image(&product("discos", None), &overrides),
            "/images/categories/discos.svg"
        );
        assert_eq!(
            resolve_image(&product("embragues", None), &overrides),
            PLACEHOLDER_IMAGE
        );
    }

    #[test]
    fn augment_fills_every_image() {
        let out = augment(
            vec![product("discos", None), product("kits", Some("/k.png"))],
            &CategoryImages::new(),
        );
        assert!(out.iter().all(|p| p.image_url.is_some()));
        assert_eq!(
            out.get(1).and_then(|p| p.image_url.as_deref()),
            Some("/k.png")
        );
    }

    #[test]
    fn reseed_when_empty_or_unknown_category() {
        assert!(needs_reseed(&[]));
        assert!(needs_reseed(&[product("discos", None), product("frenos-viejos", None)]));
        assert!(!needs_reseed(&[product("discos", None)]));
    }
}
