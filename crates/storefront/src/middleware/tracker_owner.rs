//! Session-scoped tracker ownership.
//!
//! Tracker handlers take a [`TrackerOwner`] argument. The extractor reads
//! the owner id from the visitor's session and assigns a new one on first
//! use, so each browser only ever sees its own vehicles and records.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session::keys;
use crate::services::TrackerOwner;

impl<S> FromRequestParts<S> for TrackerOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        owner_for(&session).await
    }
}

/// The session's tracker owner, created and stored when absent.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn owner_for(session: &Session) -> Result<TrackerOwner, AppError> {
    let stored = session
        .get::<String>(keys::TRACKER_OWNER)
        .await?
        .and_then(|id| Uuid::parse_str(&id).ok());

    if let Some(id) = stored {
        return Ok(TrackerOwner::from_uuid(id));
    }

    let owner = TrackerOwner::generate();
    session
        .insert(keys::TRACKER_OWNER, owner.as_uuid().to_string())
        .await?;
    tracing::debug!(%owner, "Assigned tracker owner to session");
    Ok(owner)
}
