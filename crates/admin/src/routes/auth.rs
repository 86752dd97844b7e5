//! Authentication route handlers for admin.
//!
//! One password-protected account; the hash comes from
//! `ADMIN_PASSWORD_HASH`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::password;
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub error: Option<String>,
}

/// Login form.
#[derive(Deserialize)]
pub struct LoginForm {
    pub password: String,
}

/// Render the login page, or go straight to the panel when logged in.
///
/// GET /auth/login
pub async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some() {
        return Redirect::to("/products").into_response();
    }
    LoginPageTemplate { error: None }.into_response()
}

/// Check the password and start a session.
///
/// POST /auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let hash = state.config().password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || {
        password::verify_password(&form.password, hash.expose_secret())
    })
    .await
    .map_err(|e| AppError::Internal(format!("password check failed: {e}")))?;

    if verified.is_err() {
        tracing::warn!("Admin login failed");
        let page = LoginPageTemplate {
            error: Some("Contraseña incorrecta".to_string()),
        };
        return Ok((StatusCode::UNAUTHORIZED, page).into_response());
    }

    set_current_admin(&session, &CurrentAdmin::now()).await?;
    set_sentry_user(CurrentAdmin::NAME);
    tracing::info!("Admin logged in");

    Ok(Redirect::to("/products").into_response())
}

/// Logout and clear session.
///
/// POST /auth/logout
pub async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    clear_sentry_user();

    Redirect::to("/auth/login")
}
