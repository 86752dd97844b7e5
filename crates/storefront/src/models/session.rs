//! Session-related types.
//!
//! The visitor's cart is stored in the session as a serialized
//! [`Cart`](frenos_core::Cart), next to the id that owns their tracker data.

use frenos_core::Cart;
use tower_sessions::Session;

/// Session keys.
pub mod keys {
    /// Key for storing the visitor's cart.
    pub const CART: &str = "cart";

    /// Key for the visitor's tracker owner id.
    pub const TRACKER_OWNER: &str = "tracker_owner";
}

/// Read the cart from the session. A missing cart is an empty one.
///
/// # Errors
///
/// Returns an error if the session store fails or the stored value cannot be
/// decoded.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Write the cart back to the session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}
