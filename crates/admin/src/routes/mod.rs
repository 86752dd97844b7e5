//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /products
//!
//! # Auth (single password from ADMIN_PASSWORD_HASH)
//! GET  /auth/login             - Login page
//! POST /auth/login             - Check password, start session
//! POST /auth/logout            - End session
//!
//! # Products
//! GET    /products             - Catalog editor page
//! GET    /api/products         - All products
//! POST   /api/products         - Create product
//! PUT    /api/products/{id}    - Replace product
//! DELETE /api/products/{id}    - Delete product
//! POST   /api/products/reseed  - Replace the table with the built-in catalog
//!
//! # Settings
//! GET|PUT         /api/settings/env          - Settings file (merged over env)
//! GET|PUT|DELETE  /api/settings/store/{key}  - JSON settings table
//!
//! # Uploads (multipart, field "file")
//! POST /api/uploads/local      - Save under UPLOAD_DIR
//! POST /api/uploads/media      - Send to the hosted media service
//!
//! # Email
//! POST /api/email/test         - SMTP test message ({to?})
//! POST /api/email/send         - Plain text message ({to, subject, body})
//! ```
//!
//! Everything except the login routes requires an admin session.

pub mod api;
pub mod auth;
pub mod email;
pub mod products;
pub mod settings;
pub mod uploads;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the product API router.
pub fn product_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/reseed", post(products::reseed))
        .route("/{id}", put(products::update).delete(products::delete))
}

/// Create the settings API router.
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/env",
            get(settings::env_settings).put(settings::save_env_settings),
        )
        .route(
            "/store/{key}",
            get(settings::get_stored)
                .put(settings::put_stored)
                .delete(settings::delete_stored),
        )
}

/// Create the upload router with its larger body limit.
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/local", post(uploads::local))
        .route("/media", post(uploads::media))
        .layer(DefaultBodyLimit::max(uploads::UPLOAD_BODY_LIMIT))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        // Auth
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/logout", post(auth::logout))
        // Products
        .route("/products", get(products::index))
        .nest("/api/products", product_api_routes())
        // Settings
        .nest("/api/settings", settings_routes())
        // Uploads
        .nest("/api/uploads", upload_routes())
        // Email
        .route("/api/email/test", post(email::test))
        .route("/api/email/send", post(email::send))
}
