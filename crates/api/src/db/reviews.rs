//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use foodhub_core::{Rating, RestaurantId, Review, ReviewDraft, ReviewId, UserId};

use super::RepositoryError;
use crate::models::CurrentUser;

const REVIEW_COLUMNS: &str =
    "id, restaurant_id, user_id, user_name, rating, comment, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    restaurant_id: RestaurantId,
    user_id: UserId,
    user_name: String,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(i64::from(row.rating)).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "rating {} out of range on review {}",
                row.rating, row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            restaurant_id: row.restaurant_id,
            user_id: row.user_id,
            user_name: row.user_name,
            rating,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a restaurant, most recently written first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            r"
            SELECT {REVIEW_COLUMNS}
            FROM foodhub.review
            WHERE restaurant_id = $1
            ORDER BY updated_at DESC, id DESC
            "
        ))
        .bind(restaurant_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    /// Insert the author's review, or replace their existing one.
    ///
    /// One statement, so two concurrent submissions by the same user still
    /// end in a single row. A replaced row keeps `id` and `created_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        restaurant_id: RestaurantId,
        author: &CurrentUser,
        draft: &ReviewDraft,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            r"
            INSERT INTO foodhub.review (restaurant_id, user_id, user_name, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (restaurant_id, user_id) DO UPDATE
            SET user_name = EXCLUDED.user_name,
                rating = EXCLUDED.rating,
                comment = EXCLUDED.comment,
                updated_at = NOW()
            RETURNING {REVIEW_COLUMNS}
            "
        ))
        .bind(restaurant_id)
        .bind(author.id)
        .bind(&author.name)
        .bind(i16::from(draft.rating.get()))
        .bind(&draft.comment)
        .fetch_one(self.pool)
        .await?;

        Review::try_from(row)
    }

    /// Get a review of a specific restaurant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        restaurant_id: RestaurantId,
        review_id: ReviewId,
    ) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM foodhub.review WHERE id = $1 AND restaurant_id = $2"
        ))
        .bind(review_id)
        .bind(restaurant_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Review::try_from).transpose()
    }

    /// Delete a review. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        restaurant_id: RestaurantId,
        review_id: ReviewId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM foodhub.review WHERE id = $1 AND restaurant_id = $2")
                .bind(review_id)
                .bind(restaurant_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
