//! SMTP email routes.
//!
//! SMTP host, port, user and sender are read from the settings file on
//! every request, so edits made in the settings editor apply without a
//! restart. The password only comes from `SMTP_PASSWORD` in the
//! environment.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use super::api::{self, ApiResponse};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::services::email::SMTP_KEYS;
use crate::services::{EmailService, SmtpSettings, settings_file};
use crate::state::AppState;

/// Test email request. Without `to`, the message goes to `SMTP_FROM`.
#[derive(Debug, Default, Deserialize)]
pub struct TestEmailRequest {
    #[serde(default)]
    pub to: Option<String>,
}

/// Free-form email request.
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
}

async fn email_service(state: &AppState) -> Result<(EmailService, SmtpSettings)> {
    let config = state.config();
    let values = settings_file::read(&config.settings_file)
        .await?
        .merged_over_env(SMTP_KEYS);
    let settings = SmtpSettings::resolve(&values, config.smtp_password.as_ref())?;
    let service = EmailService::new(&settings)?;
    Ok((service, settings))
}

/// Send the SMTP test email.
///
/// POST /api/email/test
#[instrument(skip(_admin, state, request))]
pub async fn test(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Json(request): Json<TestEmailRequest>,
) -> Result<Json<ApiResponse<()>>> {
    let (service, settings) = email_service(&state).await?;
    let to = request
        .to
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .unwrap_or(settings.from_address);

    service.send_test(&to, &state.config().base_url).await?;
    Ok(api::ok(format!("Correo de prueba enviado a {to}")))
}

/// Send a plain text email.
///
/// POST /api/email/send
#[instrument(skip(_admin, state, request), fields(to = %request.to))]
pub async fn send(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<ApiResponse<()>>> {
    if request.subject.trim().is_empty() || request.body.trim().is_empty() {
        return Err(AppError::BadRequest(
            "El asunto y el mensaje son obligatorios".to_string(),
        ));
    }

    let (service, _) = email_service(&state).await?;
    service
        .send_text(request.to.trim(), request.subject.trim(), &request.body)
        .await?;
    Ok(api::ok("Correo enviado"))
}
