//! Cart repository.
//!
//! Lines are stored as one JSONB array next to a `version` counter. Every
//! write is a compare-and-swap on that counter, which keeps concurrent
//! updates to the same cart from silently overwriting each other.

use sqlx::PgPool;
use sqlx::types::Json;

use foodhub_core::{Cart, CartId, CartLine, UserId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    lines: Json<Vec<CartLine>>,
    version: i64,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Self::restore(row.id, row.user_id, row.lines.0, row.version)
            .map_err(|e| RepositoryError::DataCorruption(format!("cart {}: {e}", row.id)))
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the cart belonging to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, lines, version FROM foodhub.cart WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Cart::try_from).transpose()
    }

    /// Get the user's cart, creating an empty one if needed.
    ///
    /// The insert only runs on a miss. Concurrent first requests are absorbed
    /// by the unique `user_id` constraint and both callers read the same row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        if let Some(cart) = self.get_by_user(user_id).await? {
            return Ok(cart);
        }

        sqlx::query(
            r"
            INSERT INTO foodhub.cart (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        self.get_by_user(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Write the cart's lines if its version is still current.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Stale` if the stored version moved on.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(&self, cart: &Cart) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            UPDATE foodhub.cart
            SET lines = $3, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING id, user_id, lines, version
            ",
        )
        .bind(cart.id())
        .bind(cart.version())
        .bind(Json(cart.lines()))
        .fetch_optional(self.pool)
        .await?;

        row.map(Cart::try_from)
            .transpose()?
            .ok_or_else(|| RepositoryError::Stale(format!("cart {}", cart.id())))
    }
}
