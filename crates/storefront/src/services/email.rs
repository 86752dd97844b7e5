//! Hosted email API client for the contact form.
//!
//! Speaks the Resend `POST /emails` API: bearer-token auth, JSON body with
//! `from`, `to`, `reply_to`, `subject` and `text`. Only the API key is fixed
//! at startup; sender and recipient come with each message
//! ([`ContactRouting`]).

use std::collections::BTreeMap;

use askama::Template;
use frenos_core::Email;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::ContactEmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The configured API key cannot be used as a header value.
    #[error("invalid API key format")]
    InvalidApiKey,

    #[error("failed to render message: {0}")]
    Render(#[from] askama::Error),
}

/// Settings keys the contact form reads on every message.
pub const CONTACT_KEYS: &[&str] = &[
    "RESEND_FROM",
    "CONTACT_EMAIL_TO",
    "STORE_EMAIL",
    "STORE_NAME",
];

/// Where contact form messages go, resolved from the store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRouting {
    /// `RESEND_FROM`
    pub from: String,
    /// `CONTACT_EMAIL_TO`, else `STORE_EMAIL`
    pub to: String,
    /// `STORE_NAME`, used in the subject
    pub store_name: Option<String>,
}

impl ContactRouting {
    /// Build the routing from settings values. `None` when the sender or
    /// every recipient candidate is missing.
    #[must_use]
    pub fn resolve(values: &BTreeMap<String, String>) -> Option<Self> {
        let value = |key: &str| {
            values
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        Some(Self {
            from: value("RESEND_FROM")?,
            to: value("CONTACT_EMAIL_TO").or_else(|| value("STORE_EMAIL"))?,
            store_name: value("STORE_NAME"),
        })
    }

    fn subject(&self, visitor: &str) -> String {
        match &self.store_name {
            Some(store) => format!("[{store}] Consulta web de {visitor}"),
            None => format!("Consulta web de {visitor}"),
        }
    }
}

/// A validated contact form submission.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub message: String,
}

#[derive(Template)]
#[template(path = "email/contact.txt")]
struct ContactBody<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    reply_to: &'a str,
    subject: String,
    text: String,
}

/// Client for the hosted email API.
#[derive(Clone)]
pub struct EmailClient {
    client: reqwest::Client,
    endpoint: String,
}

impl EmailClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ContactEmailConfig) -> Result<Self, EmailError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        let mut auth_value =
            HeaderValue::from_str(&auth_value).map_err(|_| EmailError::InvalidApiKey)?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/emails", config.api_url.trim_end_matches('/')),
        })
    }

    /// Deliver a contact form message to the store mailbox. Replies go to
    /// the visitor.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or the API request fails.
    #[instrument(skip(self, routing, contact), fields(from = %contact.email, to = %routing.to))]
    pub async fn send_contact(
        &self,
        routing: &ContactRouting,
        contact: &ContactMessage,
    ) -> Result<(), EmailError> {
        let text = ContactBody {
            name: &contact.name,
            email: contact.email.as_str(),
            phone: contact.phone.as_deref().unwrap_or_default(),
            message: &contact.message,
        }
        .render()?;

        let body = SendEmailRequest {
            from: &routing.from,
            to: [&routing.to],
            reply_to: contact.email.as_str(),
            subject: routing.subject(&contact.name),
            text,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!("Contact message delivered");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_contact_recipient_falls_back_to_store_email() {
        let routing = ContactRouting::resolve(&values(&[
            ("RESEND_FROM", "web@frenos.test"),
            ("CONTACT_EMAIL_TO", " "),
            ("STORE_EMAIL", "hola@frenos.test"),
        ]))
        .unwrap();
        assert_eq!(routing.to, "hola@frenos.test");

        let routing = ContactRouting::resolve(&values(&[
            ("RESEND_FROM", "web@frenos.test"),
            ("CONTACT_EMAIL_TO", "ventas@frenos.test"),
            ("STORE_EMAIL", "hola@frenos.test"),
        ]))
        .unwrap();
        assert_eq!(routing.to, "ventas@frenos.test");
    }

    #[test]
    fn test_contact_routing_needs_sender_and_recipient() {
        let only_recipient = values(&[("CONTACT_EMAIL_TO", "a@frenos.test")]);
        assert!(ContactRouting::resolve(&only_recipient).is_none());

        let only_sender = values(&[("RESEND_FROM", "a@frenos.test")]);
        assert!(ContactRouting::resolve(&only_sender).is_none());
    }

    #[test]
    fn test_subject_names_the_store() {
        let mut routing = ContactRouting::resolve(&values(&[
            ("RESEND_FROM", "web@frenos.test"),
            ("STORE_EMAIL", "hola@frenos.test"),
            ("STORE_NAME", "Frenos Sur"),
        ]))
        .unwrap();
        assert_eq!(routing.subject("Ana"), "[Frenos Sur] Consulta web de Ana");

        routing.store_name = None;
        assert_eq!(routing.subject("Ana"), "Consulta web de Ana");
    }
}
