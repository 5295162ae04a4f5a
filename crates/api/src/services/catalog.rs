//! Catalog service: restaurant listing, lookup and administration.

use tracing::instrument;

use foodhub_core::{
    MenuItem, Pagination, Price, Restaurant, RestaurantId, RestaurantQuery, RestaurantSeed,
};

use crate::db::Store;
use crate::error::{AppError, Result};

pub const RESTAURANT_NOT_FOUND: &str = "Restaurant not found";

pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// One page of restaurants with its pagination block.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &RestaurantQuery) -> Result<(Vec<Restaurant>, Pagination)> {
        let (restaurants, total) = self.store.list_restaurants(query).await?;
        Ok((restaurants, Pagination::new(query, total)))
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id.
    pub async fn restaurant(&self, id: RestaurantId) -> Result<Restaurant> {
        self.store
            .restaurant(id)
            .await?
            .ok_or_else(|| AppError::NotFound(RESTAURANT_NOT_FOUND.to_string()))
    }

    /// The menu of an existing restaurant.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the restaurant does not exist; an
    /// existing restaurant with no items yields an empty list.
    pub async fn menu(&self, id: RestaurantId) -> Result<Vec<MenuItem>> {
        self.restaurant(id).await?;
        Ok(self.store.menu(id).await?)
    }

    /// Add a restaurant together with its menu.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for blank required fields or
    /// out-of-range numbers.
    #[instrument(skip(self, seed), fields(name = %seed.name))]
    pub async fn create(&self, seed: &RestaurantSeed) -> Result<(Restaurant, Vec<MenuItem>)> {
        validate_seed(seed)?;
        let created = self.store.insert_restaurant(seed).await?;
        tracing::info!(restaurant_id = %created.0.id, "restaurant created");
        Ok(created)
    }
}

/// Check a restaurant seed before it reaches the store.
///
/// # Errors
///
/// Returns `AppError::BadRequest` describing the first problem found.
pub fn validate_seed(seed: &RestaurantSeed) -> Result<()> {
    let blank = |s: &str| s.trim().is_empty();
    if blank(&seed.name) || blank(&seed.cuisine) || blank(&seed.address) {
        return Err(AppError::BadRequest(
            "Please provide name, cuisine and address".to_string(),
        ));
    }
    if !(0.0..=5.0).contains(&seed.rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 0 and 5".to_string(),
        ));
    }
    if seed.delivery_time < 0 {
        return Err(AppError::BadRequest(
            "Delivery time cannot be negative".to_string(),
        ));
    }
    if seed.menu.iter().any(|item| blank(&item.name)) {
        return Err(AppError::BadRequest(
            "Every menu item needs a name".to_string(),
        ));
    }
    if seed.menu.iter().any(|item| item.price > Price::MAX_MENU) {
        return Err(AppError::BadRequest(format!(
            "Menu item price must be between 0 and {}",
            Price::MAX_MENU
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::db::memory::sample_catalog;

    #[tokio::test]
    async fn test_list_filters_by_cuisine() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let catalog = CatalogService::new(&store);

        let query = RestaurantQuery::from_params(None, None, Some("Japanese"), None, None);
        let (restaurants, pagination) = catalog.list(&query).await.unwrap();
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].name, "Sushi Bar");
        assert_eq!(pagination.total, 1);
        assert_eq!(pagination.pages, 1);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let catalog = CatalogService::new(&store);

        let query = RestaurantQuery::from_params(None, None, None, None, Some("TACO"));
        let (restaurants, _) = catalog.list(&query).await.unwrap();
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].cuisine, "Mexican");
    }

    #[tokio::test]
    async fn test_unknown_restaurant_and_menu() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let catalog = CatalogService::new(&store);

        let err = catalog.menu(RestaurantId::new(9999)).await.unwrap_err();
        assert_eq!(err.public_message(), RESTAURANT_NOT_FOUND);
        assert!(catalog.restaurant(RestaurantId::new(9999)).await.is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let mut seed = sample_catalog().restaurants.remove(0);
        seed.name = "  ".to_string();

        assert!(matches!(
            catalog.create(&seed).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_price_above_column() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let mut seed = sample_catalog().restaurants.remove(0);
        seed.menu[0].price = serde_json::from_str("100000000").unwrap();

        let err = catalog.create(&seed).await.unwrap_err();
        assert_eq!(
            err.public_message(),
            "Menu item price must be between 0 and 99999999.99"
        );

        seed.menu[0].price = Price::MAX_MENU;
        assert!(catalog.create(&seed).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_then_menu() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let seed = sample_catalog().restaurants.remove(1);

        let (restaurant, menu) = catalog.create(&seed).await.unwrap();
        assert_eq!(restaurant.name, "Sushi Bar");
        assert_eq!(catalog.menu(restaurant.id).await.unwrap(), menu);
    }
}
