//! Restaurant and menu route handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use foodhub_core::{MenuItem, Restaurant, RestaurantId, RestaurantQuery, RestaurantSeed, Role};

use crate::envelope::{ApiJson, ApiPath, Envelope};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::CatalogService;
use crate::state::AppState;

/// Raw listing parameters. Parsed leniently by [`RestaurantQuery::from_params`].
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub cuisine: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

/// A restaurant together with its menu.
#[derive(Debug, Serialize)]
pub struct RestaurantWithMenu {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub menu: Vec<MenuItem>,
}

/// Paginated restaurant listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let query = RestaurantQuery::from_params(
        params.page.as_deref(),
        params.limit.as_deref(),
        params.cuisine.as_deref(),
        params.sort.as_deref(),
        params.search.as_deref(),
    );
    let (restaurants, pagination) = CatalogService::new(state.store()).list(&query).await?;
    Ok(Envelope::list(restaurants).with_pagination(pagination))
}

/// One restaurant.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RestaurantId>,
) -> Result<Envelope<Restaurant>> {
    let restaurant = CatalogService::new(state.store()).restaurant(id).await?;
    Ok(Envelope::data(restaurant))
}

/// A restaurant's menu.
#[instrument(skip(state))]
pub async fn menu(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RestaurantId>,
) -> Result<Envelope<Vec<MenuItem>>> {
    let items = CatalogService::new(state.store()).menu(id).await?;
    Ok(Envelope::list(items))
}

/// Add a restaurant with its menu. Admins only.
#[instrument(skip(state, user, seed), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(seed): ApiJson<RestaurantSeed>,
) -> Result<impl IntoResponse> {
    user.restrict_to(&[Role::Admin])?;
    let (restaurant, menu) = CatalogService::new(state.store()).create(&seed).await?;
    Ok((
        StatusCode::CREATED,
        Envelope::data(RestaurantWithMenu { restaurant, menu }),
    ))
}
