//! WhatsApp checkout.
//!
//! There is no payment step: checking out opens a WhatsApp chat with the
//! store, prefilled with the order.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use frenos_core::Cart;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::api::{self, ApiResponse, WhatsAppLink};
use crate::error::{AppError, Result};
use crate::models::{load_cart, save_cart};
use crate::services::whatsapp;
use crate::state::AppState;

/// Optional customer note appended to the order message.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutQuery {
    #[serde(default)]
    pub note: String,
}

async fn order_link(state: &AppState, cart: &Cart, note: &str) -> Result<WhatsAppLink> {
    let number = whatsapp::store_number(
        &state.config().settings_file,
        state.config().whatsapp_number.as_deref(),
    )
    .await?;
    let message = whatsapp::order_message(cart, note)?;

    Ok(WhatsAppLink {
        url: whatsapp::link(&number, &message),
        message,
    })
}

/// Redirect to WhatsApp with the order and empty the cart.
///
/// An empty cart goes back to the cart page.
#[instrument(skip(state, session))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CheckoutQuery>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let checkout = order_link(&state, &cart, &query.note).await?;

    tracing::info!(
        items = cart.item_count(),
        total = %cart.total(),
        "Order sent to WhatsApp"
    );
    cart.clear();
    save_cart(&session, &cart).await?;

    Ok(Redirect::to(&checkout.url).into_response())
}

/// The checkout link without touching the cart.
#[instrument(skip(state, session))]
pub async fn whatsapp_link(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CheckoutQuery>,
) -> Result<Json<ApiResponse<WhatsAppLink>>> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("El carrito está vacío".to_string()));
    }

    Ok(api::data(order_link(&state, &cart, &query.note).await?))
}
