//! Integration tests for FoodHub.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests against the in-memory store
//! cargo test -p foodhub-integration-tests
//!
//! # Include the PostgreSQL store tests
//! FOODHUB_TEST_DATABASE_URL=postgres://localhost/foodhub_test \
//!     cargo test -p foodhub-integration-tests -- --include-ignored
//! ```
//!
//! [`TestApp`] drives the real router (middleware included) with
//! `tower::ServiceExt::oneshot`, backed by a [`MemoryStore`] seeded from
//! the bundled catalog fixture.

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use foodhub_api::config::ApiConfig;
use foodhub_api::db::{MemoryStore, UserStore};
use foodhub_api::state::AppState;
use foodhub_core::{CatalogSeed, Email, Role};

/// Catalog the API crate ships for seeding.
pub const CATALOG_FIXTURE: &str = include_str!("../../api/fixtures/catalog.json");

/// Signing key for test tokens.
pub const TEST_JWT_SECRET: &str = "k3v9Qz7LmW2xR8tYp4Hn6Jd1Fb5Gc0Ns";

/// Password used by [`TestApp::register`].
pub const PASSWORD: &str = "correct horse battery";

/// The parsed catalog fixture.
#[must_use]
pub fn catalog() -> CatalogSeed {
    serde_json::from_str(CATALOG_FIXTURE).expect("catalog fixture parses")
}

/// Local development config with the test signing key.
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig::local(SecretString::from(TEST_JWT_SECRET))
}

/// A response with its body decoded as JSON (`Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The envelope's `message`.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    /// The `Set-Cookie` header, if any.
    #[must_use]
    pub fn cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }
}

/// In-process application under test.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// App over the fixture catalog with the local config.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    #[must_use]
    pub fn with_config(config: ApiConfig) -> Self {
        let store = Arc::new(MemoryStore::with_catalog(&catalog()));
        let state = AppState::new(config, store.clone());
        Self {
            router: foodhub_api::app(state),
            store,
        }
    }

    /// Send a fully built request.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is JSON")
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a request with an optional bearer token and JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register a user with [`PASSWORD`] and return their token.
    pub async fn register(&self, name: &str, email: &str) -> String {
        let response = self
            .post(
                "/auth/register",
                None,
                json!({ "name": name, "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["token"]
            .as_str()
            .expect("token in body")
            .to_owned()
    }

    /// Register a user and make them an admin.
    pub async fn register_admin(&self, name: &str, email: &str) -> String {
        let token = self.register(name, email).await;
        self.store
            .set_role(&Email::parse(email).expect("valid email"), Role::Admin)
            .await
            .expect("user exists");
        token
    }

    /// Id of the fixture restaurant called `name`.
    pub async fn restaurant_id(&self, name: &str) -> i64 {
        let response = self
            .get(&format!("/restaurants?limit=100&search={}", name.replace(' ', "%20")), None)
            .await;
        response.body["data"]
            .as_array()
            .and_then(|all| all.iter().find(|r| r["name"] == name))
            .and_then(|r| r["id"].as_i64())
            .expect("fixture restaurant exists")
    }

    /// Id of the menu item called `item` at restaurant `restaurant_id`.
    pub async fn menu_item_id(&self, restaurant_id: i64, item: &str) -> i64 {
        let response = self
            .get(&format!("/restaurants/{restaurant_id}/menu"), None)
            .await;
        response.body["data"]
            .as_array()
            .and_then(|all| all.iter().find(|m| m["name"] == item))
            .and_then(|m| m["id"].as_i64())
            .expect("fixture menu item exists")
    }
}
