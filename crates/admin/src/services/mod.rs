//! Business logic services for the admin panel.
//!
//! # Services
//!
//! - `email` - SMTP email via lettre, settings resolved per send
//! - `media` - Signed uploads to the hosted media service
//! - `password` - Argon2 hashing for the admin password
//! - `settings_file` - Settings file reads and writes off the async runtime
//! - `uploads` - Image validation and local storage

pub mod email;
pub mod media;
pub mod password;
pub mod settings_file;
pub mod uploads;

pub use email::{EmailError, EmailService, SmtpSettings};
pub use media::{MediaClient, MediaError};
pub use password::PasswordError;
pub use uploads::{ImageUpload, UploadError};
