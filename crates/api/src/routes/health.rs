//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode};

use crate::envelope::Envelope;
use crate::state::AppState;

/// Liveness health check endpoint. Does not check dependencies.
pub async fn health() -> Envelope<()> {
    Envelope::message("Server is running")
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Envelope<()>) {
    match state.store().ping().await {
        Ok(()) => (StatusCode::OK, Envelope::message("Ready")),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Envelope::message("Store unavailable"),
            )
        }
    }
}
