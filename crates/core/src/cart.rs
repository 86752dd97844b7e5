//! Shopping cart.
//!
//! The cart is a plain list of product snapshots with quantities. It is
//! serialized into the visitor's session; nothing about it lives in the
//! database.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ProductId;
use crate::catalog::Product;

/// One cart line: a product and how many units of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Unit price charged for this line.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.product.effective_price()
    }

    /// `quantity × unit_price`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }
}

/// A visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add `quantity` units of `product`.
    ///
    /// If the product is already in the cart its quantity is incremented and
    /// its snapshot refreshed; otherwise a new line is appended. Adding zero
    /// units does nothing. Returns the line's resulting quantity.
    pub fn add(&mut self, product: Product, quantity: u32) -> u32 {
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            item.quantity = item.quantity.saturating_add(quantity);
            item.product = product;
            return item.quantity;
        }

        if quantity == 0 {
            return 0;
        }

        self.items.push(CartItem { product, quantity });
        quantity
    }

    /// Set the quantity of a line; zero removes it.
    ///
    /// Returns `false` when the product is not in the cart.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }

        match self.items.iter_mut().find(|i| &i.product.id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns `false` when the product is not in the cart.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product.id != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product.id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Sum of line totals, using sale prices where they apply.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }
}
