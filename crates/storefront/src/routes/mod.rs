//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//!
//! # Products
//! GET  /products               - Product listing (?category=, ?q=)
//! GET  /products/{id}          - Product detail
//! GET  /products/{id}/inquiry  - Redirect to a WhatsApp product question
//!
//! # Cart
//! GET  /cart                   - Cart page
//! GET  /api/cart               - Cart JSON
//! POST /api/cart/add           - Add product ({productId, quantity?})
//! POST /api/cart/update        - Set quantity ({productId, quantity}, 0 removes)
//! POST /api/cart/remove        - Remove line ({productId})
//! POST /api/cart/clear         - Empty the cart
//!
//! # Checkout
//! GET  /checkout               - Redirect to WhatsApp with the order, clears cart
//! GET  /api/checkout/whatsapp  - Order link JSON, cart untouched
//!
//! # Contact
//! POST /api/contact            - Contact form (rate limited)
//!
//! # Tracker
//! GET|POST        /api/tracker/vehicles
//! GET|PUT|DELETE  /api/tracker/vehicles/{id}
//! GET|POST        /api/tracker/vehicles/{id}/{kind}
//! PUT|DELETE      /api/tracker/vehicles/{id}/{kind}/{record_id}
//! GET             /api/tracker/vehicles/{id}/oil-changes/{record_id}/whatsapp
//! GET|PUT         /api/tracker/workshop
//! POST            /api/tracker/workshop/technicians
//! DELETE          /api/tracker/workshop/technicians/{name}
//! GET|POST        /api/tracker/backup
//! ```
//!
//! `{kind}` is one of `oil-changes`, `brake-services`, `mechanic-services`.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod products;
pub mod tracker;

use axum::{
    Router,
    routing::{get, post, put},
};
use frenos_core::tracker::{BrakeService, MechanicService, OilChange};

use crate::middleware::contact_rate_limiter;
use crate::state::AppState;
use tracker::RecordKind;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/inquiry", get(products::inquiry))
}

/// Create the cart API router.
pub fn cart_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::summary))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// CRUD routes for one record kind, nested under a vehicle.
fn record_routes<D: RecordKind>() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(tracker::list_records::<D>).post(tracker::create_record::<D>),
        )
        .route(
            "/{record_id}",
            put(tracker::update_record::<D>).delete(tracker::delete_record::<D>),
        )
}

/// Create the tracker API router.
pub fn tracker_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/vehicles",
            get(tracker::list_vehicles).post(tracker::create_vehicle),
        )
        .route(
            "/vehicles/{id}",
            get(tracker::get_vehicle)
                .put(tracker::update_vehicle)
                .delete(tracker::delete_vehicle),
        )
        .nest("/vehicles/{id}/oil-changes", record_routes::<OilChange>())
        .nest(
            "/vehicles/{id}/brake-services",
            record_routes::<BrakeService>(),
        )
        .nest(
            "/vehicles/{id}/mechanic-services",
            record_routes::<MechanicService>(),
        )
        .route(
            "/vehicles/{id}/oil-changes/{record_id}/whatsapp",
            get(tracker::oil_change_whatsapp),
        )
        .route(
            "/workshop",
            get(tracker::get_workshop).put(tracker::save_workshop),
        )
        .route("/workshop/technicians", post(tracker::add_technician))
        .route(
            "/workshop/technicians/{name}",
            axum::routing::delete(tracker::remove_technician),
        )
        .route(
            "/backup",
            get(tracker::export_backup).post(tracker::import_backup),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .nest("/products", product_routes())
        // Cart page and API
        .route("/cart", get(cart::show))
        .nest("/api/cart", cart_api_routes())
        // WhatsApp checkout
        .route("/checkout", get(checkout::checkout))
        .route("/api/checkout/whatsapp", get(checkout::whatsapp_link))
        // Contact form
        .route(
            "/api/contact",
            post(contact::submit).layer(contact_rate_limiter()),
        )
        // Vehicle tracker
        .nest("/api/tracker", tracker_routes())
}
