//! Persistence for the API.
//!
//! # Database: `foodhub`
//!
//! ## Tables
//!
//! - `user` / `user_password` - Accounts and their Argon2 hashes
//! - `restaurant` / `menu_item` - The catalog
//! - `cart` - One row per user, lines stored as JSONB, guarded by `version`
//! - `customer_order` - Immutable order snapshots (items as JSONB)
//! - `review` - Unique per (`restaurant_id`, `user_id`)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p foodhub-cli -- migrate
//! ```
//!
//! # Stores
//!
//! Handlers never talk to `sqlx` directly. They go through the [`Store`]
//! traits, implemented by [`PgStore`] in production and by
//! [`MemoryStore`] for tests and fixtures.

pub mod carts;
pub mod catalog;
pub mod memory;
pub mod orders;
pub mod reviews;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use foodhub_core::{
    Cart, CatalogSeed, Email, MenuItem, MenuItemId, NewOrder, Order, OrderId, Restaurant,
    RestaurantId, RestaurantQuery, RestaurantSeed, Review, ReviewDraft, ReviewId, Role, UserId,
};

pub use carts::CartRepository;
pub use catalog::CatalogRepository;
pub use memory::MemoryStore;
pub use orders::OrderRepository;
pub use reviews::ReviewRepository;
pub use users::UserRepository;

use crate::models::CurrentUser;
use crate::models::user::{NewUser, User};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A compare-and-swap write lost against a concurrent writer.
    #[error("stale write: {0}")]
    Stale(String),
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Store Traits
// =============================================================================

/// Accounts and password hashes.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user with its password hash.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the email is taken.
    async fn create_user(&self, user: &NewUser, password_hash: &str)
    -> Result<User, RepositoryError>;

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// The user and their password hash, if the email is registered.
    async fn user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Change a user's role. Fails with [`RepositoryError::NotFound`].
    async fn set_role(&self, email: &Email, role: Role) -> Result<User, RepositoryError>;
}

/// Restaurants and menus.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// One page of restaurants plus the total number of matches.
    async fn list_restaurants(
        &self,
        query: &RestaurantQuery,
    ) -> Result<(Vec<Restaurant>, u64), RepositoryError>;

    async fn restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError>;

    async fn menu(&self, restaurant_id: RestaurantId) -> Result<Vec<MenuItem>, RepositoryError>;

    /// A menu item, only if it belongs to `restaurant_id`.
    async fn menu_item(
        &self,
        restaurant_id: RestaurantId,
        item_id: MenuItemId,
    ) -> Result<Option<MenuItem>, RepositoryError>;

    /// Insert a restaurant and its menu.
    async fn insert_restaurant(
        &self,
        seed: &RestaurantSeed,
    ) -> Result<(Restaurant, Vec<MenuItem>), RepositoryError>;

    /// Insert every restaurant of a fixture. Returns how many were added.
    async fn seed_catalog(&self, seed: &CatalogSeed) -> Result<usize, RepositoryError> {
        for restaurant in &seed.restaurants {
            self.insert_restaurant(restaurant).await?;
        }
        Ok(seed.restaurants.len())
    }
}

/// One cart per user.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// The user's cart, creating an empty one if none exists.
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError>;

    /// Write `cart` back if its version is still current.
    ///
    /// Returns the cart at its new version, or [`RepositoryError::Stale`]
    /// when another writer got there first.
    async fn save_cart(&self, cart: &Cart) -> Result<Cart, RepositoryError>;
}

/// Orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert `order` and empty `cart` as one unit.
    ///
    /// The cart reset is guarded by the cart version, so a concurrent
    /// mutation or a second checkout of the same cart fails with
    /// [`RepositoryError::Stale`] and nothing is written.
    async fn place_order(&self, cart: &Cart, order: NewOrder) -> Result<Order, RepositoryError>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// All of a user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;
}

/// Reviews, unique per (restaurant, user).
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Reviews of a restaurant, newest first.
    async fn reviews_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Review>, RepositoryError>;

    /// Insert or replace the author's review of a restaurant.
    ///
    /// A replaced review keeps its id and creation time.
    async fn upsert_review(
        &self,
        restaurant_id: RestaurantId,
        author: &CurrentUser,
        draft: &ReviewDraft,
    ) -> Result<Review, RepositoryError>;

    async fn review(
        &self,
        restaurant_id: RestaurantId,
        review_id: ReviewId,
    ) -> Result<Option<Review>, RepositoryError>;

    /// Returns `false` if nothing was deleted.
    async fn delete_review(
        &self,
        restaurant_id: RestaurantId,
        review_id: ReviewId,
    ) -> Result<bool, RepositoryError>;
}

/// Every store the API needs.
#[async_trait]
pub trait Store: UserStore + CatalogStore + CartStore + OrderStore + ReviewStore {
    /// Cheap liveness probe for the readiness endpoint.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

// =============================================================================
// Postgres
// =============================================================================

/// Production store backed by a `PostgreSQL` pool.
///
/// Each call builds the matching borrowed repository.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        user: &NewUser,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool)
            .create_with_password(user, password_hash)
            .await
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_id(id).await
    }

    async fn user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        UserRepository::new(&self.pool).get_password_hash(email).await
    }

    async fn set_role(&self, email: &Email, role: Role) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).set_role(email, role).await
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_restaurants(
        &self,
        query: &RestaurantQuery,
    ) -> Result<(Vec<Restaurant>, u64), RepositoryError> {
        CatalogRepository::new(&self.pool).list(query).await
    }

    async fn restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        CatalogRepository::new(&self.pool).get_restaurant(id).await
    }

    async fn menu(&self, restaurant_id: RestaurantId) -> Result<Vec<MenuItem>, RepositoryError> {
        CatalogRepository::new(&self.pool).get_menu(restaurant_id).await
    }

    async fn menu_item(
        &self,
        restaurant_id: RestaurantId,
        item_id: MenuItemId,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        CatalogRepository::new(&self.pool)
            .get_menu_item(restaurant_id, item_id)
            .await
    }

    async fn insert_restaurant(
        &self,
        seed: &RestaurantSeed,
    ) -> Result<(Restaurant, Vec<MenuItem>), RepositoryError> {
        CatalogRepository::new(&self.pool).insert(seed).await
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        CartRepository::new(&self.pool).get_by_user(user_id).await
    }

    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        CartRepository::new(&self.pool).get_or_create(user_id).await
    }

    async fn save_cart(&self, cart: &Cart) -> Result<Cart, RepositoryError> {
        CartRepository::new(&self.pool).save(cart).await
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn place_order(&self, cart: &Cart, order: NewOrder) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool).place(cart, order).await
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).get_by_id(id).await
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).list_for_user(user_id).await
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn reviews_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Review>, RepositoryError> {
        ReviewRepository::new(&self.pool)
            .list_for_restaurant(restaurant_id)
            .await
    }

    async fn upsert_review(
        &self,
        restaurant_id: RestaurantId,
        author: &CurrentUser,
        draft: &ReviewDraft,
    ) -> Result<Review, RepositoryError> {
        ReviewRepository::new(&self.pool)
            .upsert(restaurant_id, author, draft)
            .await
    }

    async fn review(
        &self,
        restaurant_id: RestaurantId,
        review_id: ReviewId,
    ) -> Result<Option<Review>, RepositoryError> {
        ReviewRepository::new(&self.pool)
            .get(restaurant_id, review_id)
            .await
    }

    async fn delete_review(
        &self,
        restaurant_id: RestaurantId,
        review_id: ReviewId,
    ) -> Result<bool, RepositoryError> {
        ReviewRepository::new(&self.pool)
            .delete(restaurant_id, review_id)
            .await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
