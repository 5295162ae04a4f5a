//! Cart route handlers. Every route requires authentication.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use foodhub_core::{Cart, MenuItemId, Quantity, RestaurantId};

use crate::envelope::{ApiJson, ApiPath, Envelope};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::{AddItem, CartService};
use crate::state::AppState;

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddForm {
    pub restaurant_id: Option<RestaurantId>,
    pub item_id: Option<MenuItemId>,
    pub quantity: Option<i64>,
}

/// Update-quantity form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateForm {
    pub item_id: Option<MenuItemId>,
    pub quantity: Option<i64>,
}

/// The caller's cart, created on first access.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Envelope<Cart>> {
    let cart = CartService::new(state.store()).get(user.id).await?;
    Ok(Envelope::data(cart))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<AddForm>,
) -> Result<Envelope<Cart>> {
    let (Some(restaurant_id), Some(item_id), Some(quantity)) =
        (form.restaurant_id, form.item_id, form.quantity)
    else {
        return Err(AppError::BadRequest(
            "Please provide restaurantId, itemId, and quantity".to_string(),
        ));
    };

    let request = AddItem {
        restaurant_id,
        item_id,
        quantity: Quantity::try_from(quantity)?,
    };
    let cart = CartService::new(state.store()).add(user.id, request).await?;
    Ok(Envelope::data(cart))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<UpdateForm>,
) -> Result<Envelope<Cart>> {
    let (Some(item_id), Some(quantity)) = (form.item_id, form.quantity) else {
        return Err(AppError::BadRequest(
            "Please provide itemId and quantity".to_string(),
        ));
    };

    let cart = CartService::new(state.store())
        .update(user.id, item_id, quantity)
        .await?;
    Ok(Envelope::data(cart))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(item_id): ApiPath<MenuItemId>,
) -> Result<Envelope<Cart>> {
    let cart = CartService::new(state.store())
        .remove(user.id, item_id)
        .await?;
    Ok(Envelope::data(cart))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Envelope<Cart>> {
    let cart = CartService::new(state.store()).clear(user.id).await?;
    Ok(Envelope::data(cart))
}
