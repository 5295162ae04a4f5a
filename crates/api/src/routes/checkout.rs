//! Checkout and order history handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use foodhub_core::{Order, OrderId};

use crate::envelope::{ApiJson, ApiPath, Envelope};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::CheckoutService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub payment_method: Option<String>,
    pub delivery_address: Option<String>,
}

/// Place an order from the caller's cart.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<CheckoutForm>,
) -> Result<impl IntoResponse> {
    let order = CheckoutService::new(state.store())
        .place(
            user.id,
            form.payment_method.as_deref(),
            form.delivery_address.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Envelope::data(order)))
}

/// The caller's orders, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Envelope<Vec<Order>>> {
    let orders = CheckoutService::new(state.store()).orders(user.id).await?;
    Ok(Envelope::list(orders))
}

/// One order; owner or admin only.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Envelope<Order>> {
    let order = CheckoutService::new(state.store()).order(&user, id).await?;
    Ok(Envelope::data(order))
}
