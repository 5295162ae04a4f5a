//! Registration, login, token and cookie handling over HTTP.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::json;

use foodhub_api::config::ApiConfig;
use foodhub_integration_tests::{PASSWORD, TestApp, test_config};

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_returns_token_cookie_and_profile() {
    let app = TestApp::new();
    let response = app
        .post(
            "/auth/register",
            None,
            json!({
                "name": "Ana Lima",
                "email": "ana@example.com",
                "password": PASSWORD,
                "phone": "555-0101",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["status"], "success");
    assert!(response.body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let user = &response.body["data"]["user"];
    assert_eq!(user["name"], "Ana Lima");
    assert_eq!(user["email"], "ana@example.com");
    assert_eq!(user["role"], "user");
    assert!(user.get("password").is_none());

    let cookie = response.cookie().expect("auth cookie set");
    assert!(cookie.starts_with("jwt="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new();
    app.register("Ana", "ana@example.com").await;

    let response = app
        .post(
            "/auth/register",
            None,
            json!({ "name": "Other Ana", "email": "ana@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "User with that email already exists");
    assert_eq!(response.body["status"], "fail");
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();

    let missing = app
        .post("/auth/register", None, json!({ "email": "x@example.com" }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message(), "Please provide name, email and password");

    let short = app
        .post(
            "/auth/register",
            None,
            json!({ "name": "X", "email": "x@example.com", "password": "short" }),
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let bad_email = app
        .post(
            "/auth/register",
            None,
            json!({ "name": "X", "email": "not-an-email", "password": PASSWORD }),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_body() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Invalid request body");
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::new();
    app.register("Ana", "ana@example.com").await;

    let response = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "ana@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["user"]["name"], "Ana");
    assert!(response.cookie().is_some());

    let token = response.body["token"].as_str().unwrap();
    let me = app.get("/auth/me", Some(token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["user"]["email"], "ana@example.com");
}

#[tokio::test]
async fn test_login_failures_share_message() {
    let app = TestApp::new();
    app.register("Ana", "ana@example.com").await;

    let wrong_password = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "ana@example.com", "password": "incorrect-password" }),
        )
        .await;
    let unknown_email = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;

    for response in [&wrong_password, &unknown_email] {
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.message(), "Invalid credentials");
    }
}

#[tokio::test]
async fn test_login_missing_fields() {
    let app = TestApp::new();
    let response = app
        .post("/auth/login", None, json!({ "email": "ana@example.com" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Please provide email and password");
}

// =============================================================================
// Token Handling
// =============================================================================

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new();

    let none = app.get("/auth/me", None).await;
    assert_eq!(none.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        none.message(),
        "You are not logged in. Please log in to get access."
    );

    let garbage = app.get("/auth/me", Some("not.a.token")).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        garbage.message(),
        "Invalid token or expired. Please log in again."
    );
}

#[tokio::test]
async fn test_cookie_authenticates() {
    let app = TestApp::new();
    let token = app.register("Ana", "ana@example.com").await;

    let request = Request::builder()
        .uri("/auth/me")
        .header(header::COOKIE, format!("theme=dark; jwt={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["user"]["name"], "Ana");
}

#[tokio::test]
async fn test_token_from_other_key_rejected() {
    let app = TestApp::new();
    let other = TestApp::with_config(ApiConfig::local(
        "Zp8wLq3Tn6Vb1Xc9Mk4Rj7Hs2Fd5Gy0A".to_owned().into(),
    ));
    let foreign = other.register("Ana", "ana@example.com").await;

    let response = app.get("/auth/me", Some(&foreign)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_overwrites_cookie() {
    let app = TestApp::new();
    let response = app.get("/auth/logout", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "success");
    let cookie = response.cookie().unwrap();
    assert!(cookie.starts_with("jwt=loggedout"));
    assert!(cookie.contains("Max-Age=10"));
}

// =============================================================================
// Rate Limiting
// =============================================================================

#[tokio::test]
async fn test_auth_routes_rate_limited_per_ip() {
    let mut config = test_config();
    config.rate_limit = true;
    let app = TestApp::with_config(config);

    let login = |ip: &'static str| {
        Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(r#"{"email":"a@example.com","password":"whatever1"}"#))
            .unwrap()
    };

    for _ in 0..5 {
        let response = app.send(login("203.0.113.7")).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let limited = app.send(login("203.0.113.7")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["status"], "fail");
    assert_eq!(
        limited.message(),
        "Too many requests, please try again later"
    );

    // Another client is unaffected, and so are non-auth routes.
    let other = app.send(login("198.51.100.1")).await;
    assert_eq!(other.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/health", None).await.status, StatusCode::OK);
}
