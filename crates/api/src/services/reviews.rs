//! Reviews: one per (restaurant, user), replaced on resubmission.

use serde_json::Value;
use tracing::instrument;

use foodhub_core::{RestaurantId, Review, ReviewDraft, ReviewId};

use super::catalog::RESTAURANT_NOT_FOUND;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::CurrentUser;

pub const REVIEW_NOT_FOUND: &str = "Review not found";
pub const REVIEW_FORBIDDEN: &str = "You are not authorized to delete this review";

pub struct ReviewService<'a> {
    store: &'a dyn Store,
}

impl<'a> ReviewService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Reviews of a restaurant, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown restaurant.
    pub async fn list(&self, restaurant_id: RestaurantId) -> Result<Vec<Review>> {
        self.ensure_restaurant(restaurant_id).await?;
        Ok(self.store.reviews_for_restaurant(restaurant_id).await?)
    }

    /// Write the caller's review of a restaurant, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Review` for a bad rating or blank comment and
    /// `AppError::NotFound` for an unknown restaurant.
    #[instrument(skip(self, author, rating, comment), fields(user_id = %author.id))]
    pub async fn upsert(
        &self,
        restaurant_id: RestaurantId,
        author: &CurrentUser,
        rating: Option<&Value>,
        comment: Option<&str>,
    ) -> Result<Review> {
        let draft = ReviewDraft::new(rating, comment)?;
        self.ensure_restaurant(restaurant_id).await?;
        Ok(self
            .store
            .upsert_review(restaurant_id, author, &draft)
            .await?)
    }

    /// Delete a review. Authors may delete their own; admins any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Forbidden`.
    #[instrument(skip(self, caller), fields(user_id = %caller.id))]
    pub async fn delete(
        &self,
        restaurant_id: RestaurantId,
        review_id: ReviewId,
        caller: &CurrentUser,
    ) -> Result<()> {
        let review = self
            .store
            .review(restaurant_id, review_id)
            .await?
            .ok_or_else(|| AppError::NotFound(REVIEW_NOT_FOUND.to_string()))?;

        if !caller.can_access(review.user_id) {
            return Err(AppError::Forbidden(REVIEW_FORBIDDEN.to_string()));
        }

        if !self.store.delete_review(restaurant_id, review_id).await? {
            return Err(AppError::NotFound(REVIEW_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    async fn ensure_restaurant(&self, restaurant_id: RestaurantId) -> Result<()> {
        if self.store.restaurant(restaurant_id).await?.is_none() {
            return Err(AppError::NotFound(RESTAURANT_NOT_FOUND.to_string()));
        }
        Ok(())
    }
}
