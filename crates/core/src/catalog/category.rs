//! Master list of product categories.

use serde::Serialize;

/// A product category with its display name and default image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Stable identifier stored on products (`"pastillas"`).
    pub slug: &'static str,
    /// Name shown in the storefront.
    pub name: &'static str,
    /// Image used for products in this category that have no image of their own.
    pub default_image: &'static str,
}

/// Every category the storefront knows about, in menu order.
pub const CATEGORIES: &[Category] = &[
    Category {
        slug: "pastillas",
        name: "Pastillas de Freno",
        default_image: "/images/categories/pastillas.svg",
    },
    Category {
        slug: "discos",
        name: "Discos de Freno",
        default_image: "/images/categories/discos.svg",
    },
    Category {
        slug: "zapatas",
        name: "Zapatas de Freno",
        default_image: "/images/categories/zapatas.svg",
    },
    Category {
        slug: "campanas",
        name: "Campanas de Freno",
        default_image: "/images/categories/campanas.svg",
    },
    Category {
        slug: "liquidos",
        name: "Líquido de Frenos",
        default_image: "/images/categories/liquidos.svg",
    },
    Category {
        slug: "bombas",
        name: "Bombas de Freno",
        default_image: "/images/categories/bombas.svg",
    },
    Category {
        slug: "cilindros",
        name: "Cilindros de Rueda",
        default_image: "/images/categories/cilindros.svg",
    },
    Category {
        slug: "kits",
        name: "Kits de Freno",
        default_image: "/images/categories/kits.svg",
    },
];

impl Category {
    /// Look up a category by slug.
    #[must_use]
    pub fn find(slug: &str) -> Option<&'static Self> {
        CATEGORIES.iter().find(|c| c.slug == slug)
    }

    /// Whether `slug` names a category in the master list.
    #[must_use]
    pub fn is_known(slug: &str) -> bool {
        Self::find(slug).is_some()
    }

    /// Display name for a slug, falling back to the slug itself.
    #[must_use]
    pub fn display_name(slug: &str) -> &str {
        Self::find(slug).map_or(slug, |c| c.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_unique() {
        for (i, a) in CATEGORIES.iter().enumerate() {
            for b in CATEGORIES.iter().skip(i + 1) {
                assert_ne!(a.slug, b.slug);
            }
        }
    }

    #[test]
    fn display_name_falls_back_to_slug() {
        assert_eq!(Category::display_name("discos"), "Discos de Freno");
        assert_eq!(Category::display_name("embragues"), "embragues");
    }
}
