//! Checkout and order history over HTTP.

use axum::http::StatusCode;
use serde_json::{Value, json};

use foodhub_integration_tests::TestApp;

async fn fill_cart(app: &TestApp, token: &str, item: &str, quantity: i64) {
    let roma = app.restaurant_id("Trattoria Roma").await;
    let item_id = app.menu_item_id(roma, item).await;
    let response = app
        .post(
            "/cart/add",
            Some(token),
            json!({ "restaurantId": roma, "itemId": item_id, "quantity": quantity }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

fn checkout_body() -> Value {
    json!({ "paymentMethod": "card", "deliveryAddress": "1 Elm St" })
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let app = TestApp::new();
    let token = app.register("Ana", "ana@example.com").await;
    fill_cart(&app, &token, "Tiramisu", 2).await;

    let response = app.post("/checkout", Some(&token), checkout_body()).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let order = &response.body["data"];
    assert_eq!(order["status"], "pending");
    assert_eq!(order["totalItems"], 2);
    assert_eq!(order["totalPrice"], json!(13.5));
    assert_eq!(order["paymentMethod"], "card");
    assert_eq!(order["deliveryAddress"], "1 Elm St");
    assert_eq!(order["estimatedDeliveryTime"], 30);
    assert_eq!(order["items"][0]["name"], "Tiramisu");

    let cart = app.get("/cart", Some(&token)).await;
    assert_eq!(cart.body["data"]["totalItems"], 0);
    assert_eq!(cart.body["data"]["items"], json!([]));
}

#[tokio::test]
async fn test_checkout_empty_cart() {
    let app = TestApp::new();
    let token = app.register("Ana", "ana@example.com").await;

    let no_cart = app.post("/checkout", Some(&token), checkout_body()).await;
    assert_eq!(no_cart.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_cart.message(), "Your cart is empty");

    app.get("/cart", Some(&token)).await;
    let empty = app.post("/checkout", Some(&token), checkout_body()).await;
    assert_eq!(empty.message(), "Your cart is empty");

    let orders = app.get("/checkout/orders", Some(&token)).await;
    assert_eq!(orders.body["results"], 0);
}

#[tokio::test]
async fn test_checkout_twice_creates_one_order() {
    let app = TestApp::new();
    let token = app.register("Ana", "ana@example.com").await;
    fill_cart(&app, &token, "Tiramisu", 1).await;

    let first = app.post("/checkout", Some(&token), checkout_body()).await;
    let second = app.post("/checkout", Some(&token), checkout_body()).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(second.status, StatusCode::BAD_REQUEST);

    let orders = app.get("/checkout/orders", Some(&token)).await;
    assert_eq!(orders.body["results"], 1);
}

#[tokio::test]
async fn test_checkout_missing_fields() {
    let app = TestApp::new();
    let token = app.register("Ana", "ana@example.com").await;
    fill_cart(&app, &token, "Tiramisu", 1).await;

    let response = app
        .post("/checkout", Some(&token), json!({ "paymentMethod": "card" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.message(),
        "Please provide payment method and delivery address"
    );

    // The cart is untouched.
    let cart = app.get("/cart", Some(&token)).await;
    assert_eq!(cart.body["data"]["totalItems"], 1);
}

#[tokio::test]
async fn test_order_is_a_snapshot() {
    let app = TestApp::new();
    let token = app.register("Ana", "ana@example.com").await;
    fill_cart(&app, &token, "Tiramisu", 1).await;
    let placed = app.post("/checkout", Some(&token), checkout_body()).await;
    let id = placed.body["data"]["id"].as_i64().unwrap();

    fill_cart(&app, &token, "Margherita Pizza", 4).await;

    let order = app.get(&format!("/checkout/orders/{id}"), Some(&token)).await;
    assert_eq!(order.status, StatusCode::OK);
    assert_eq!(order.body["data"]["totalItems"], 1);
    assert_eq!(order.body["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_history_newest_first() {
    let app = TestApp::new();
    let token = app.register("Ana", "ana@example.com").await;

    let mut ids = Vec::new();
    for item in ["Tiramisu", "Spaghetti Carbonara"] {
        fill_cart(&app, &token, item, 1).await;
        let placed = app.post("/checkout", Some(&token), checkout_body()).await;
        ids.push(placed.body["data"]["id"].clone());
    }

    let orders = app.get("/checkout/orders", Some(&token)).await;
    assert_eq!(orders.body["results"], 2);
    assert_eq!(orders.body["data"][0]["id"], ids[1]);
    assert_eq!(orders.body["data"][1]["id"], ids[0]);
}

#[tokio::test]
async fn test_order_visibility() {
    let app = TestApp::new();
    let owner = app.register("Ana", "ana@example.com").await;
    let stranger = app.register("Bo", "bo@example.com").await;
    let admin = app.register_admin("Root", "root@example.com").await;

    fill_cart(&app, &owner, "Tiramisu", 1).await;
    let placed = app.post("/checkout", Some(&owner), checkout_body()).await;
    let uri = format!("/checkout/orders/{}", placed.body["data"]["id"]);

    assert_eq!(app.get(&uri, Some(&owner)).await.status, StatusCode::OK);
    assert_eq!(app.get(&uri, Some(&admin)).await.status, StatusCode::OK);

    let denied = app.get(&uri, Some(&stranger)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.message(), "You are not authorized to view this order");

    // Other people's orders never show up in a history.
    let theirs = app.get("/checkout/orders", Some(&stranger)).await;
    assert_eq!(theirs.body["results"], 0);

    let missing = app.get("/checkout/orders/424242", Some(&owner)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.message(), "Order not found");
}
