//! Contact form route handler.
//!
//! Messages are delivered to the store mailbox through the hosted email API.
//! Sender and recipient are read from the settings file for every message.
//! The route is rate limited per client IP.

use axum::{Json, extract::State};
use frenos_core::{Email, PhoneNumber};
use serde::Deserialize;
use tracing::instrument;

use super::api::{self, ApiResponse};
use crate::error::{AppError, Result};
use crate::services::email::CONTACT_KEYS;
use crate::services::{ContactMessage, ContactRouting, store_settings};
use crate::state::AppState;

/// Longest message accepted, in characters.
const MAX_MESSAGE_CHARS: usize = 5000;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
}

impl ContactForm {
    /// Trim and validate the submission.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BadRequest`] with a message for the visitor.
    pub fn validate(self) -> Result<ContactMessage> {
        let name = self.name.trim().to_string();
        let message = self.message.trim().to_string();

        if name.is_empty() {
            return Err(AppError::BadRequest("El nombre es obligatorio".to_string()));
        }
        if message.is_empty() {
            return Err(AppError::BadRequest("El mensaje es obligatorio".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::BadRequest(
                "El mensaje es demasiado largo".to_string(),
            ));
        }

        let email = Email::parse(self.email.trim())
            .map_err(|_| AppError::BadRequest("Ingresá un email válido".to_string()))?;

        let phone = match self.phone.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                PhoneNumber::parse(raw).map_err(|_| {
                    AppError::BadRequest("Ingresá un teléfono válido".to_string())
                })?;
                Some(raw.to_string())
            }
        };

        Ok(ContactMessage {
            name,
            email,
            phone,
            message,
        })
    }
}

/// Submit the contact form.
///
/// POST /api/contact
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<Json<ApiResponse<()>>> {
    let contact = form.validate()?;

    let Some(client) = state.email() else {
        tracing::error!("Contact email is not configured");
        return Err(AppError::ServiceUnavailable(
            "El formulario de contacto no está disponible".to_string(),
        ));
    };

    let values = store_settings::merged(&state.config().settings_file, CONTACT_KEYS).await?;
    let Some(routing) = ContactRouting::resolve(&values) else {
        tracing::error!("Contact email sender or recipient is not configured");
        return Err(AppError::ServiceUnavailable(
            "El formulario de contacto no está disponible".to_string(),
        ));
    };

    client.send_contact(&routing, &contact).await?;
    tracing::info!(email = %contact.email, "Contact message sent");

    Ok(api::ok("¡Gracias! Te responderemos a la brevedad."))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, phone: Option<&str>, message: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_valid_form_is_trimmed() {
        let contact = form(" Ana ", "ana@example.com", Some(" "), " Hola ")
            .validate()
            .unwrap();
        assert_eq!(contact.name, "Ana");
        assert_eq!(contact.message, "Hola");
        assert!(contact.phone.is_none());
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let err = form("Ana", "no-es-email", None, "Hola")
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_short_phone_is_rejected() {
        let err = form("Ana", "ana@example.com", Some("123"), "Hola")
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_blank_message_is_rejected() {
        assert!(form("Ana", "ana@example.com", None, "   ").validate().is_err());
    }
}
