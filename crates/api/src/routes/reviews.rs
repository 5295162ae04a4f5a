//! Review route handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use foodhub_core::{RestaurantId, Review, ReviewId};

use crate::envelope::{ApiJson, ApiPath, Envelope};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::ReviewService;
use crate::state::AppState;

/// Review form data. `rating` stays raw so numeric strings are accepted.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: Option<Value>,
    pub comment: Option<String>,
}

pub async fn index(
    State(state): State<AppState>,
    ApiPath(restaurant_id): ApiPath<RestaurantId>,
) -> Result<Envelope<Vec<Review>>> {
    let reviews = ReviewService::new(state.store()).list(restaurant_id).await?;
    Ok(Envelope::list(reviews))
}

#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn upsert(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(restaurant_id): ApiPath<RestaurantId>,
    ApiJson(form): ApiJson<ReviewForm>,
) -> Result<impl IntoResponse> {
    let review = ReviewService::new(state.store())
        .upsert(
            restaurant_id,
            &user,
            form.rating.as_ref(),
            form.comment.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Envelope::data(review)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath((restaurant_id, review_id)): ApiPath<(RestaurantId, ReviewId)>,
) -> Result<Envelope<()>> {
    ReviewService::new(state.store())
        .delete(restaurant_id, review_id, &user)
        .await?;
    Ok(Envelope::message("Review deleted successfully"))
}
