//! Cart API and WhatsApp checkout against an in-process storefront.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use frenos_core::{Catalog, Product};
use frenos_integration_tests::spawn_storefront;
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn builtin_products() -> Vec<Product> {
    Catalog::builtin().unwrap().into_products()
}

fn items(cart: &Value) -> &Vec<Value> {
    cart["data"]["items"].as_array().unwrap()
}

#[tokio::test]
async fn test_adding_same_product_increments_quantity() {
    let server = spawn_storefront().await;
    let product = builtin_products().remove(0);

    let add = json!({ "productId": product.id.as_str() });
    server.post_json("/api/cart/add", &add).await;
    let (status, cart) = server.post_json("/api/cart/add", &add).await;

    assert!(status.is_success());
    assert_eq!(items(&cart).len(), 1);
    assert_eq!(cart["data"]["items"][0]["quantity"], 2);
    assert_eq!(cart["data"]["itemCount"], 2);
}

#[tokio::test]
async fn test_quantity_zero_removes_line() {
    let server = spawn_storefront().await;
    let products = builtin_products();
    let first = products[0].id.as_str();
    let second = products[1].id.as_str();

    server
        .post_json("/api/cart/add", &json!({ "productId": first, "quantity": 3 }))
        .await;
    server
        .post_json("/api/cart/add", &json!({ "productId": second }))
        .await;
    let (_, cart) = server
        .post_json(
            "/api/cart/update",
            &json!({ "productId": first, "quantity": 0 }),
        )
        .await;

    assert_eq!(items(&cart).len(), 1);
    assert_eq!(cart["data"]["items"][0]["productId"], second);

    let (_, cart) = server.get_json("/api/cart").await;
    assert_eq!(items(&cart).len(), 1);
}

#[tokio::test]
async fn test_total_uses_effective_prices() {
    let server = spawn_storefront().await;
    let products = builtin_products();
    let discounted = products.iter().find(|p| p.is_discounted());
    let regular = products.iter().find(|p| !p.is_discounted()).unwrap();

    let mut expected = regular.effective_price() * Decimal::from(2);
    server
        .post_json(
            "/api/cart/add",
            &json!({ "productId": regular.id.as_str(), "quantity": 2 }),
        )
        .await;
    if let Some(product) = discounted {
        expected += product.effective_price();
        server
            .post_json("/api/cart/add", &json!({ "productId": product.id.as_str() }))
            .await;
    }

    let (_, cart) = server.get_json("/api/cart").await;
    let total: Decimal = serde_json::from_value(cart["data"]["total"].clone()).unwrap();
    assert_eq!(total, expected);
}

#[tokio::test]
async fn test_unknown_product_is_rejected() {
    let server = spawn_storefront().await;
    let (status, body) = server
        .post_json("/api/cart/add", &json!({ "productId": "no-existe" }))
        .await;

    assert!(status.is_client_error());
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_checkout_redirects_to_whatsapp_and_clears_cart() {
    let server = spawn_storefront().await;
    let product = builtin_products().remove(0);
    server
        .post_json(
            "/api/cart/add",
            &json!({ "productId": product.id.as_str(), "quantity": 2 }),
        )
        .await;

    let (_, link) = server.get_json("/api/checkout/whatsapp").await;
    let url = link["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("https://wa.me/5491155550000?text="));
    assert!(link["data"]["message"].as_str().unwrap().contains(&product.code));

    // The link endpoint leaves the cart alone.
    let (_, cart) = server.get_json("/api/cart").await;
    assert_eq!(items(&cart).len(), 1);

    let response = server
        .client
        .get(server.url("/checkout"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("https://wa.me/5491155550000?text="));

    let (_, cart) = server.get_json("/api/cart").await;
    assert!(items(&cart).is_empty());
}

#[tokio::test]
async fn test_checkout_with_empty_cart_returns_to_cart() {
    let server = spawn_storefront().await;

    let response = server
        .client
        .get(server.url("/checkout"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()["location"], "/cart");

    let (status, body) = server.get_json("/api/checkout/whatsapp").await;
    assert!(status.is_client_error());
    assert_eq!(body["success"], false);
}
