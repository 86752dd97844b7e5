//! Frenos storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused. [`app`] assembles the full router
//! with its middleware stack; the binary only adds configuration, tracing
//! and the listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::{Router, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;

use state::AppState;

/// Build the storefront application.
///
/// Sessions use the `PostgreSQL` store when the state has a database pool
/// and an in-memory store otherwise.
pub fn app(state: AppState) -> Router {
    let config = state.config();

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .nest_service("/images", ServeDir::new(config.static_dir.join("images")))
        .nest_service("/static", ServeDir::new(&config.static_dir));

    let router = match state.pool() {
        Some(pool) => router.layer(middleware::create_session_layer(
            PostgresStore::new(pool.clone()),
            config,
        )),
        None => router.layer(middleware::create_session_layer(
            MemoryStore::default(),
            config,
        )),
    };

    router
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity when a database is configured.
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use frenos_core::catalog::{CATEGORIES, PLACEHOLDER_IMAGE};

    /// Images under `/images` come from `static/images`.
    fn static_file(url: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("static")
            .join(url.trim_start_matches('/'))
    }

    #[test]
    fn test_category_default_images_are_shipped() {
        for category in CATEGORIES {
            let path = static_file(category.default_image);
            assert!(path.is_file(), "missing {}", path.display());
        }
    }

    #[test]
    fn test_placeholder_is_shipped() {
        assert!(static_file(PLACEHOLDER_IMAGE).is_file());
    }
}
