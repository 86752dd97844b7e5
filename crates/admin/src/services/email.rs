//! SMTP email for the admin panel.
//!
//! Uses SMTP via lettre for delivery with Askama templates. Host, port,
//! username and sender come from the settings file (falling back to the
//! environment) and are resolved on every send, so edits made on the
//! settings page apply without a restart.

use std::collections::BTreeMap;

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Settings keys consulted for SMTP delivery.
pub const SMTP_KEYS: &[&str] = &["SMTP_HOST", "SMTP_PORT", "SMTP_USERNAME", "SMTP_FROM"];

const DEFAULT_SMTP_PORT: u16 = 587;

/// HTML template for the test email.
#[derive(Template)]
#[template(path = "email/test.html")]
struct TestEmailHtml<'a> {
    admin_url: &'a str,
}

/// Plain text template for the test email.
#[derive(Template)]
#[template(path = "email/test.txt")]
struct TestEmailText<'a> {
    admin_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// A required SMTP setting is missing.
    #[error("SMTP not configured: {0} is not set")]
    NotConfigured(&'static str),

    /// A setting holds an unusable value.
    #[error("Invalid SMTP setting {0}: {1}")]
    InvalidSetting(&'static str, String),

    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// SMTP connection details for one send.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from_address: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl SmtpSettings {
    /// Build settings from merged `SMTP_*` values.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::NotConfigured`] when `SMTP_HOST` or `SMTP_FROM`
    /// is missing and [`EmailError::InvalidSetting`] for a bad port.
    pub fn resolve(
        values: &BTreeMap<String, String>,
        password: Option<&SecretString>,
    ) -> Result<Self, EmailError> {
        let host = non_empty(values, "SMTP_HOST").ok_or(EmailError::NotConfigured("SMTP_HOST"))?;
        let from_address =
            non_empty(values, "SMTP_FROM").ok_or(EmailError::NotConfigured("SMTP_FROM"))?;
        let port = match non_empty(values, "SMTP_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| EmailError::InvalidSetting("SMTP_PORT", e.to_string()))?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            host,
            port,
            username: non_empty(values, "SMTP_USERNAME"),
            password: password.cloned(),
            from_address,
        })
    }
}

fn non_empty(values: &BTreeMap<String, String>, key: &str) -> Option<String> {
    values
        .get(key)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Email service for sending admin emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: Mailbox,
}

impl EmailService {
    /// Create a new email service from resolved settings.
    ///
    /// Credentials are only sent when both username and password are set.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured or the sender address
    /// is invalid.
    pub fn new(settings: &SmtpSettings) -> Result<Self, EmailError> {
        let from_address = settings
            .from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(settings.from_address.clone()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
            from_address,
        })
    }

    /// Send the SMTP test email.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_test(&self, to: &str, admin_url: &str) -> Result<(), EmailError> {
        let html = TestEmailHtml { admin_url }.render()?;
        let text = TestEmailText { admin_url }.render()?;

        self.send_multipart_email(to, "Frenos: correo de prueba", &text, &html)
            .await
    }

    /// Send a plain text email.
    ///
    /// # Errors
    ///
    /// Returns error if the address is invalid or delivery fails.
    pub async fn send_text(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from_address.clone())
            .to(parse_mailbox(to)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from_address.clone())
            .to(parse_mailbox(to)?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_requires_host_and_sender() {
        let err = SmtpSettings::resolve(&values(&[("SMTP_FROM", "a@b.com")]), None).unwrap_err();
        assert!(matches!(err, EmailError::NotConfigured("SMTP_HOST")));

        let err =
            SmtpSettings::resolve(&values(&[("SMTP_HOST", "smtp.test")]), None).unwrap_err();
        assert!(matches!(err, EmailError::NotConfigured("SMTP_FROM")));
    }

    #[test]
    fn test_resolve_defaults_port() {
        let settings = SmtpSettings::resolve(
            &values(&[("SMTP_HOST", "smtp.test"), ("SMTP_FROM", "tienda@frenos.test")]),
            None,
        )
        .unwrap();
        assert_eq!(settings.port, 587);
        assert!(settings.username.is_none());
    }

    #[test]
    fn test_resolve_rejects_bad_port() {
        let err = SmtpSettings::resolve(
            &values(&[
                ("SMTP_HOST", "smtp.test"),
                ("SMTP_FROM", "tienda@frenos.test"),
                ("SMTP_PORT", "smtp"),
            ]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, EmailError::InvalidSetting("SMTP_PORT", _)));
    }

    #[test]
    fn test_settings_debug_redacts_password() {
        let settings = SmtpSettings::resolve(
            &values(&[
                ("SMTP_HOST", "smtp.test"),
                ("SMTP_FROM", "tienda@frenos.test"),
                ("SMTP_USERNAME", "tienda"),
            ]),
            Some(&SecretString::from("smtp-hunter2")),
        )
        .unwrap();

        let debug_output = format!("{settings:?}");
        assert!(debug_output.contains("smtp.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("smtp-hunter2"));
    }

    #[tokio::test]
    async fn test_service_rejects_bad_sender() {
        let settings = SmtpSettings {
            host: "smtp.test".to_string(),
            port: 587,
            username: None,
            password: None,
            from_address: "not an address".to_string(),
        };
        assert!(matches!(
            EmailService::new(&settings),
            Err(EmailError::InvalidAddress(_))
        ));
    }
}
