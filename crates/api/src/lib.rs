//! FoodHub API library.
//!
//! The HTTP service lives here as a library so the binary, the CLI and the
//! integration tests all build the same router through [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, header},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::state::AppState;

/// Build the application router with its full middleware stack.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so
/// the auth rate limiter can fall back to the peer address.
pub fn app(state: AppState) -> Router {
    let mut auth = routes::auth_routes();
    if state.config().rate_limit {
        match middleware::auth_rate_limiter() {
            Some(limiter) => {
                auth = auth
                    .layer(limiter)
                    .layer(axum::middleware::map_response(
                        middleware::rate_limit_envelope,
                    ));
            }
            None => tracing::warn!("auth rate limiter misconfigured, running without it"),
        }
    }

    Router::new()
        .merge(routes::routes())
        .nest("/auth", auth)
        .fallback(routes::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::error_detail_middleware,
        ))
        .layer(cors_layer(state.config()))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the configured frontend origin only, with credentials.
///
/// Without `FRONTEND_URL` no CORS headers are sent and browsers fall back
/// to same-origin.
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let Some(origin) = config
        .frontend_url
        .as_deref()
        .and_then(|url| HeaderValue::from_str(url.trim_end_matches('/')).ok())
    else {
        return CorsLayer::new();
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
