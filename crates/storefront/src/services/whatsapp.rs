//! WhatsApp click-to-chat links.
//!
//! Orders, product inquiries and service notices are plain-text messages
//! rendered from `templates/whatsapp/*.txt` and handed to `wa.me`, which opens
//! a chat with the message prefilled. Nothing is sent server-side.

use std::path::Path;

use askama::Template;
use frenos_core::tracker::{OilChangeRecord, Vehicle, WorkshopInfo};
use frenos_core::{Cart, PhoneNumber, Price, Product};
use thiserror::Error;

use super::store_settings;

/// Settings file key holding the store's WhatsApp number.
pub const NUMBER_KEY: &str = "WHATSAPP_NUMBER";

#[derive(Debug, Error)]
pub enum WhatsAppError {
    /// No usable store number in the settings file or environment.
    #[error("WhatsApp number is not configured")]
    NotConfigured,

    #[error("failed to render message: {0}")]
    Render(#[from] askama::Error),

    #[error("failed to read settings file: {0}")]
    Settings(#[from] std::io::Error),
}

/// `https://wa.me/<digits>?text=<percent-encoded message>`.
#[must_use]
pub fn link(number: &PhoneNumber, message: &str) -> String {
    format!(
        "https://wa.me/{}?text={}",
        number.as_str(),
        urlencoding::encode(message)
    )
}

/// The store number: settings file first, then `fallback` (the environment).
///
/// The file is read on every call so edits from the admin panel apply
/// without a restart.
///
/// # Errors
///
/// Returns [`WhatsAppError::NotConfigured`] when neither source has a valid
/// number, or an I/O error if the file exists but cannot be read.
pub async fn store_number(
    settings_file: &Path,
    fallback: Option<&str>,
) -> Result<PhoneNumber, WhatsAppError> {
    let file = store_settings::read(settings_file).await?;
    let from_file = file.get(NUMBER_KEY).map(str::to_owned);

    from_file
        .as_deref()
        .or(fallback)
        .and_then(|raw| PhoneNumber::parse(raw).ok())
        .ok_or(WhatsAppError::NotConfigured)
}

struct OrderLine {
    quantity: u32,
    name: String,
    code: String,
    unit_price: String,
    total: String,
}

#[derive(Template)]
#[template(path = "whatsapp/order.txt")]
struct OrderMessage<'a> {
    lines: Vec<OrderLine>,
    total: String,
    note: &'a str,
}

#[derive(Template)]
#[template(path = "whatsapp/inquiry.txt")]
struct InquiryMessage<'a> {
    product: &'a Product,
    price: String,
}

#[derive(Template)]
#[template(path = "whatsapp/oil_change.txt")]
struct OilChangeNotice<'a> {
    vehicle: &'a Vehicle,
    workshop_name: &'a str,
    workshop_phone: &'a str,
    date: String,
    mileage: u32,
    next_change: String,
    oil: String,
    filters: String,
    technician: &'a str,
}

/// Order message for the whole cart. `note` is an optional customer comment.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn order_message(cart: &Cart, note: &str) -> Result<String, WhatsAppError> {
    let lines = cart
        .lines()
        .iter()
        .map(|item| OrderLine {
            quantity: item.quantity,
            name: item.product.name.clone(),
            code: item.product.code.clone(),
            unit_price: Price::ars(item.unit_price()).display(),
            total: Price::ars(item.line_total()).display(),
        })
        .collect();

    let message = OrderMessage {
        lines,
        total: Price::ars(cart.total()).display(),
        note: note.trim(),
    };
    Ok(message.render()?)
}

/// Question about a single product.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn inquiry_message(product: &Product) -> Result<String, WhatsAppError> {
    let message = InquiryMessage {
        product,
        price: Price::ars(product.effective_price()).display(),
    };
    Ok(message.render()?)
}

/// Notice to a vehicle owner about a completed oil change.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn oil_change_message(
    vehicle: &Vehicle,
    record: &OilChangeRecord,
    workshop: &WorkshopInfo,
) -> Result<String, WhatsAppError> {
    let details = &record.details;

    let mut filters = Vec::new();
    if details.oil_filter {
        filters.push("aceite");
    }
    if details.air_filter {
        filters.push("aire");
    }
    if details.fuel_filter {
        filters.push("combustible");
    }
    if details.cabin_filter {
        filters.push("habitáculo");
    }

    let oil = match &details.oil_brand {
        Some(brand) => format!("{} {}", brand, details.oil_type),
        None => details.oil_type.clone(),
    };

    let message = OilChangeNotice {
        vehicle,
        workshop_name: if workshop.name.is_empty() {
            "nuestro taller"
        } else {
            &workshop.name
        },
        workshop_phone: &workshop.phone,
        date: details.date.format("%d/%m/%Y").to_string(),
        mileage: details.mileage,
        next_change: details
            .next_change_mileage
            .map(|km| km.to_string())
            .unwrap_or_default(),
        oil,
        filters: filters.join(", "),
        technician: &details.technician,
    };
    Ok(message.render()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use frenos_core::tracker::{OilChange, ServiceRecord, VehicleInfo};
    use frenos_core::{Catalog, RecordId, VehicleId};

    use super::*;

    fn product(id: &str) -> Product {
        Catalog::builtin()
            .unwrap()
            .find(&frenos_core::ProductId::new(id))
            .cloned()
            .unwrap()
    }

    #[test]
    fn link_percent_encodes_the_message() {
        let number = PhoneNumber::parse("+54 9 11 5555-1234").unwrap();
        let url = link(&number, "Hola, ¿tienen stock? 2 x $ 1.000");
        assert_eq!(
            url,
            "https://wa.me/5491155551234?text=Hola%2C%20%C2%BFtienen%20stock%3F%202%20x%20%24%201.000"
        );
    }

    #[test]
    fn order_message_lists_lines_and_total() {
        let mut cart = Cart::new();
        cart.add(product("pf-001"), 2);
        cart.add(product("df-001"), 1);

        let message = order_message(&cart, "  Retiro en el local ").unwrap();
        let first = cart.lines().first().unwrap();
        assert!(message.contains(&format!("2 x {}", first.product.name)));
        assert!(message.contains(&Price::ars(cart.total()).display()));
        assert!(message.contains("Retiro en el local"));
    }

    #[test]
    fn order_message_omits_blank_note() {
        let mut cart = Cart::new();
        cart.add(product("pf-001"), 1);
        let message = order_message(&cart, "   ").unwrap();
        assert!(!message.contains("Nota"));
    }

    #[test]
    fn inquiry_mentions_code() {
        let p = product("df-001");
        let message = inquiry_message(&p).unwrap();
        assert!(message.contains(&p.code));
        assert!(message.contains(&p.name));
    }

    #[test]
    fn oil_change_notice_lists_filters() {
        let vehicle = Vehicle {
            id: VehicleId::new("v1"),
            info: VehicleInfo {
                make: "Toyota".to_string(),
                model: "Etios".to_string(),
                year: 2019,
                patente: "AB123CD".to_string(),
                owner_name: "Marcos".to_string(),
                owner_phone: Some("1155551234".to_string()),
                image_url: None,
            },
        };
        let record = ServiceRecord {
            id: RecordId::new("r1"),
            vehicle_id: vehicle.id.clone(),
            details: OilChange {
                date: NaiveDate::from_ymd_opt(2024, 7, 3).unwrap(),
                mileage: 45_000,
                next_change_mileage: Some(55_000),
                oil_type: "5W-30".to_string(),
                oil_brand: Some("Total".to_string()),
                oil_filter: true,
                air_filter: true,
                fuel_filter: false,
                cabin_filter: false,
                notes: String::new(),
                technician: "Luis".to_string(),
            },
        };
        let workshop = WorkshopInfo {
            name: "Frenos Sur".to_string(),
            ..WorkshopInfo::default()
        };

        let message = oil_change_message(&vehicle, &record, &workshop).unwrap();
        assert!(message.contains("Marcos"));
        assert!(message.contains("AB123CD"));
        assert!(message.contains("03/07/2024"));
        assert!(message.contains("Total 5W-30"));
        assert!(message.contains("aceite, aire"));
        assert!(message.contains("55000"));
        assert!(message.contains("Frenos Sur"));
    }
}
