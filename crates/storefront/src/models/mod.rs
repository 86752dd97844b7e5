//! Domain models for storefront.
//!
//! Products, carts and tracker records live in `frenos-core`; this module
//! only holds what is specific to the web layer.

pub mod session;

pub use session::{load_cart, save_cart};
