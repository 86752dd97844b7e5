//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Product catalog from the database or the static list, cached
//! - `email` - Contact form delivery through the hosted email API
//! - `store_settings` - Settings file shared with the admin panel, read per request
//! - `tracker_store` - File-backed storage for the vehicle service tracker
//! - `whatsapp` - Order, inquiry and service notice messages as `wa.me` links

pub mod catalog;
pub mod email;
pub mod store_settings;
pub mod tracker_store;
pub mod whatsapp;

pub use catalog::CatalogService;
pub use email::{ContactMessage, ContactRouting, EmailClient, EmailError};
pub use tracker_store::{FileStore, TrackerHandle, TrackerOwner, TrackerTaskError};
pub use whatsapp::WhatsAppError;
