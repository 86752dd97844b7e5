//! Session-related types for admin authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session-stored admin identity.
///
/// The panel has a single password-protected account, so the session only
/// records when the login happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub logged_in_at: DateTime<Utc>,
}

impl CurrentAdmin {
    /// Name shown in the panel and attached to error reports.
    pub const NAME: &'static str = "admin";

    #[must_use]
    pub fn now() -> Self {
        Self {
            logged_in_at: Utc::now(),
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
