//! Catalog repository: restaurants and their menus.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use foodhub_core::{
    MenuItem, MenuItemId, Price, Restaurant, RestaurantId, RestaurantQuery, RestaurantSeed,
    RestaurantSort,
};

use super::RepositoryError;

const RESTAURANT_COLUMNS: &str = "id, name, cuisine, rating, delivery_time, price_range, image, \
                                  address, description, is_open, created_at";

const MENU_ITEM_COLUMNS: &str =
    "id, restaurant_id, name, price, description, image, category, is_popular";

#[derive(Debug, sqlx::FromRow)]
struct RestaurantRow {
    id: RestaurantId,
    name: String,
    cuisine: String,
    rating: f64,
    delivery_time: i32,
    price_range: Option<String>,
    image: Option<String>,
    address: String,
    description: Option<String>,
    is_open: bool,
    created_at: DateTime<Utc>,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            cuisine: row.cuisine,
            rating: row.rating,
            delivery_time: row.delivery_time,
            price_range: row.price_range,
            image: row.image,
            address: row.address,
            description: row.description,
            is_open: row.is_open,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: MenuItemId,
    restaurant_id: RestaurantId,
    name: String,
    price: Price,
    description: Option<String>,
    image: Option<String>,
    category: Option<String>,
    is_popular: bool,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        Self {
            id: row.id,
            restaurant_id: row.restaurant_id,
            name: row.name,
            price: row.price,
            description: row.description,
            image: row.image,
            category: row.category,
            is_popular: row.is_popular,
        }
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 2);
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &RestaurantQuery) {
    builder.push(" WHERE TRUE");
    if let Some(cuisine) = &query.cuisine {
        builder.push(" AND cuisine = ").push_bind(cuisine.clone());
    }
    if let Some(search) = &query.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR cuisine ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of restaurants matching `query`, plus the total match count.
    ///
    /// Ties in the requested sort are broken by id so paging is stable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        query: &RestaurantQuery,
    ) -> Result<(Vec<Restaurant>, u64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM foodhub.restaurant");
        push_filters(&mut count, query);
        let (total,): (i64,) = count.build_query_as().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RESTAURANT_COLUMNS} FROM foodhub.restaurant"
        ));
        push_filters(&mut select, query);
        select.push(match query.sort {
            Some(RestaurantSort::RatingDesc) => " ORDER BY rating DESC, id ASC",
            Some(RestaurantSort::DeliveryTimeAsc) => " ORDER BY delivery_time ASC, id ASC",
            None => " ORDER BY id ASC",
        });
        select
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let rows: Vec<RestaurantRow> = select.build_query_as().fetch_all(self.pool).await?;

        Ok((
            rows.into_iter().map(Restaurant::from).collect(),
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    /// Get a restaurant by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_restaurant(
        &self,
        id: RestaurantId,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM foodhub.restaurant WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Restaurant::from))
    }

    /// All menu items of a restaurant, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_menu(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, MenuItemRow>(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM foodhub.menu_item WHERE restaurant_id = $1 ORDER BY id"
        ))
        .bind(restaurant_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    /// A menu item, only if it belongs to `restaurant_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_menu_item(
        &self,
        restaurant_id: RestaurantId,
        item_id: MenuItemId,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM foodhub.menu_item WHERE id = $1 AND restaurant_id = $2"
        ))
        .bind(item_id)
        .bind(restaurant_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(MenuItem::from))
    }

    /// Insert a restaurant with its whole menu in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// written in that case.
    pub async fn insert(
        &self,
        seed: &RestaurantSeed,
    ) -> Result<(Restaurant, Vec<MenuItem>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let restaurant = sqlx::query_as::<_, RestaurantRow>(&format!(
            r"
            INSERT INTO foodhub.restaurant
                (name, cuisine, rating, delivery_time, price_range, image, address, description, is_open)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {RESTAURANT_COLUMNS}
            "
        ))
        .bind(&seed.name)
        .bind(&seed.cuisine)
        .bind(seed.rating)
        .bind(seed.delivery_time)
        .bind(seed.price_range.as_deref())
        .bind(seed.image.as_deref())
        .bind(&seed.address)
        .bind(seed.description.as_deref())
        .bind(seed.is_open)
        .fetch_one(&mut *tx)
        .await
        .map(Restaurant::from)?;

        let mut menu = Vec::with_capacity(seed.menu.len());
        for item in &seed.menu {
            let row = sqlx::query_as::<_, MenuItemRow>(&format!(
                r"
                INSERT INTO foodhub.menu_item
                    (restaurant_id, name, price, description, image, category, is_popular)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {MENU_ITEM_COLUMNS}
                "
            ))
            .bind(restaurant.id)
            .bind(&item.name)
            .bind(item.price)
            .bind(item.description.as_deref())
            .bind(item.image.as_deref())
            .bind(item.category.as_deref())
            .bind(item.is_popular)
            .fetch_one(&mut *tx)
            .await?;
            menu.push(MenuItem::from(row));
        }

        tx.commit().await?;

        tracing::info!(restaurant_id = %restaurant.id, items = menu.len(), "restaurant inserted");
        Ok((restaurant, menu))
    }
}
