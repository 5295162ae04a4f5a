//! Order repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use foodhub_core::{
    Cart, CartLine, NewOrder, Order, OrderId, OrderStatus, Price, RestaurantId, UserId,
};

use super::RepositoryError;

const ORDER_COLUMNS: &str = "id, user_id, restaurant_id, items, total_items, total_price, \
                             payment_method, delivery_address, status, estimated_delivery_time, \
                             created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    restaurant_id: RestaurantId,
    items: Json<Vec<CartLine>>,
    total_items: i64,
    total_price: Price,
    payment_method: String,
    delivery_address: String,
    status: OrderStatus,
    estimated_delivery_time: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let total_items = u64::try_from(row.total_items).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative total_items on order {}",
                row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            restaurant_id: row.restaurant_id,
            items: row.items.0,
            total_items,
            total_price: row.total_price,
            payment_method: row.payment_method,
            delivery_address: row.delivery_address,
            status: row.status,
            estimated_delivery_time: row.estimated_delivery_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and empty the cart it came from, atomically.
    ///
    /// The cart is cleared first with a version check; if that matches no
    /// row the transaction is dropped and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Stale` if the cart changed since it was read.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn place(&self, cart: &Cart, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let cleared = sqlx::query(
            r"
            UPDATE foodhub.cart
            SET lines = '[]'::jsonb, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            ",
        )
        .bind(cart.id())
        .bind(cart.version())
        .execute(&mut *tx)
        .await?;

        if cleared.rows_affected() == 0 {
            return Err(RepositoryError::Stale(format!("cart {}", cart.id())));
        }

        let total_items = i64::try_from(order.total_items).map_err(|_| {
            RepositoryError::DataCorruption("order item count out of range".to_owned())
        })?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO foodhub.customer_order
                (user_id, restaurant_id, items, total_items, total_price,
                 payment_method, delivery_address, status, estimated_delivery_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(order.restaurant_id)
        .bind(Json(&order.items))
        .bind(total_items)
        .bind(order.total_price)
        .bind(&order.payment_method)
        .bind(&order.delivery_address)
        .bind(order.status)
        .bind(order.estimated_delivery_time)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Order::try_from(row)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM foodhub.customer_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// All orders of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM foodhub.customer_order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
