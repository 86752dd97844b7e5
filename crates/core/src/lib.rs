//! Frenos Core - Shared domain library.
//!
//! This crate provides the domain types and logic used across all Frenos
//! components:
//! - `storefront` - Public brake parts shop and vehicle service tracker
//! - `admin` - Store administration panel
//! - `cli` - Command-line tools for migrations, seeding and backups
//!
//! # Architecture
//!
//! The core crate contains types and pure logic - no database access, no
//! HTTP clients. File I/O is limited to the settings file helpers. The
//! tracker is written against the [`tracker::KeyValueStore`] trait so the
//! storefront decides where its data lives.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and phone numbers
//! - [`catalog`] - Products, categories and image resolution
//! - [`cart`] - Session shopping cart
//! - [`tracker`] - Vehicles, service records, workshop info and backups
//! - [`settings`] - `KEY=value` settings files

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod settings;
pub mod tracker;
pub mod types;

pub use cart::{Cart, CartItem};
pub use catalog::{Catalog, CatalogError, Category, Product};
pub use settings::{EnvFile, EnvFileError};
pub use tracker::{Tracker, TrackerError};
pub use types::*;
