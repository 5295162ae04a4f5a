//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                 - Liveness probe
//! GET    /health/ready                           - Readiness probe (store ping)
//!
//! POST   /auth/register                          - Create account, set cookie
//! POST   /auth/login                             - Email/password login, set cookie
//! GET    /auth/me                                - Current user (auth)
//! GET    /auth/logout                            - Overwrite auth cookie
//!
//! GET    /restaurants                            - Paginated listing (?page&limit&cuisine&sort&search)
//! POST   /restaurants                            - Create restaurant with menu (admin)
//! GET    /restaurants/{id}                       - Restaurant detail
//! GET    /restaurants/{id}/menu                  - Restaurant menu
//!
//! GET    /cart                                   - Current cart (auth)
//! POST   /cart/add                               - Add item (auth)
//! PUT    /cart/update                            - Set item quantity (auth)
//! DELETE /cart/remove/{itemId}                   - Remove item (auth)
//! DELETE /cart/clear                             - Empty cart (auth)
//!
//! POST   /checkout                               - Place order from cart (auth)
//! GET    /checkout/orders                        - Order history (auth)
//! GET    /checkout/orders/{id}                   - Order detail (owner or admin)
//!
//! GET    /reviews/restaurant/{id}                - Reviews of a restaurant
//! POST   /reviews/restaurant/{id}                - Create or replace own review (auth)
//! DELETE /reviews/restaurant/{id}/{reviewId}     - Delete review (author or admin)
//! ```
//!
//! Anything else is a 404 envelope naming the path.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod restaurants;
pub mod reviews;

use axum::{
    Router,
    http::Uri,
    routing::{delete, get, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

/// Build the complete router, except `/auth` which is nested separately
/// so it can carry its own rate limiter.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/restaurants", restaurant_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/reviews", review_routes())
}

/// Authentication routes, mounted under `/auth`.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", get(auth::logout))
}

fn restaurant_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(restaurants::index).post(restaurants::create))
        .route("/{id}", get(restaurants::show))
        .route("/{id}/menu", get(restaurants::menu))
}

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", put(cart::update))
        .route("/remove/{item_id}", delete(cart::remove))
        .route("/clear", delete(cart::clear))
}

fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::create))
        .route("/orders", get(checkout::index))
        .route("/orders/{id}", get(checkout::show))
}

fn review_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/restaurant/{id}",
            get(reviews::index).post(reviews::upsert),
        )
        .route("/restaurant/{id}/{review_id}", delete(reviews::delete))
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Not Found - {}", uri.path()))
}
