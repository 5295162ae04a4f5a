//! Cart service.
//!
//! Loads the caller's cart, applies one mutation from
//! [`foodhub_core::Cart`] and writes it back with a version check. A lost
//! race surfaces as `RepositoryError::Stale` (409); nothing is retried here.

use tracing::instrument;

use foodhub_core::{Cart, MenuItemId, Quantity, RestaurantId, UserId};

use super::catalog::RESTAURANT_NOT_FOUND;
use crate::db::Store;
use crate::error::{AppError, Result};

pub const CART_NOT_FOUND: &str = "Cart not found";
pub const MENU_ITEM_NOT_FOUND: &str = "Menu item not found";

/// A validated add-to-cart request.
#[derive(Debug, Clone, Copy)]
pub struct AddItem {
    pub restaurant_id: RestaurantId,
    pub item_id: MenuItemId,
    pub quantity: Quantity,
}

pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The caller's cart, created empty on first access.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart> {
        Ok(self.store.get_or_create_cart(user_id).await?)
    }

    /// Add `quantity` of a menu item, capturing its current name and price.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the restaurant or item does not exist,
    /// and `AppError::Cart` if the cart holds another restaurant's items.
    #[instrument(skip(self))]
    pub async fn add(&self, user_id: UserId, request: AddItem) -> Result<Cart> {
        if self.store.restaurant(request.restaurant_id).await?.is_none() {
            return Err(AppError::NotFound(RESTAURANT_NOT_FOUND.to_string()));
        }
        let item = self
            .store
            .menu_item(request.restaurant_id, request.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(MENU_ITEM_NOT_FOUND.to_string()))?;

        let mut cart = self.store.get_or_create_cart(user_id).await?;
        cart.add_item(&item, request.quantity)?;
        Ok(self.store.save_cart(&cart).await?)
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if there is no cart, `AppError::Cart`
    /// if the line is absent.
    #[instrument(skip(self))]
    pub async fn update(&self, user_id: UserId, item_id: MenuItemId, quantity: i64) -> Result<Cart> {
        let mut cart = self.existing(user_id).await?;
        cart.update_quantity(item_id, quantity)?;
        Ok(self.store.save_cart(&cart).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if there is no cart, `AppError::Cart`
    /// if the line is absent.
    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: UserId, item_id: MenuItemId) -> Result<Cart> {
        let mut cart = self.existing(user_id).await?;
        cart.remove_item(item_id)?;
        Ok(self.store.save_cart(&cart).await?)
    }

    /// Empty the cart, keeping its identity.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user never had a cart.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<Cart> {
        let mut cart = self.existing(user_id).await?;
        cart.clear();
        Ok(self.store.save_cart(&cart).await?)
    }

    async fn existing(&self, user_id: UserId) -> Result<Cart> {
        self.store
            .cart_for_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(CART_NOT_FOUND.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use foodhub_core::{CartError, Price, RestaurantQuery};

    use super::*;
    use crate::db::memory::sample_catalog;
    use crate::db::{CartStore, CatalogStore, MemoryStore, RepositoryError};

    const USER: UserId = UserId::new(500);

    async fn first_items(store: &MemoryStore) -> Vec<(RestaurantId, MenuItemId)> {
        let (restaurants, _) = store
            .list_restaurants(&RestaurantQuery::default())
            .await
            .unwrap();
        let mut out = Vec::new();
        for r in restaurants {
            let item = store.menu(r.id).await.unwrap().remove(0);
            out.push((r.id, item.id));
        }
        out
    }

    fn add(restaurant_id: RestaurantId, item_id: MenuItemId, n: i64) -> AddItem {
        AddItem {
            restaurant_id,
            item_id,
            quantity: Quantity::try_from(n).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_get_creates_empty_cart() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let carts = CartService::new(&store);

        let cart = carts.get(USER).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Price::ZERO);
        assert_eq!(carts.get(USER).await.unwrap().id(), cart.id());
    }

    #[tokio::test]
    async fn test_add_increments_and_rejects_other_restaurant() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let carts = CartService::new(&store);
        let items = first_items(&store).await;
        let (a, x) = items[0];
        let (b, y) = items[1];

        carts.add(USER, add(a, x, 2)).await.unwrap();
        let cart = carts.add(USER, add(a, x, 1)).await.unwrap();
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), Price::from_cents(3000));

        let err = carts.add(USER, add(b, y, 1)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Cart(CartError::CrossRestaurant { .. })
        ));
        assert_eq!(carts.get(USER).await.unwrap().total_items(), 3);
    }

    #[tokio::test]
    async fn test_add_unknown_item_or_restaurant() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let carts = CartService::new(&store);
        let items = first_items(&store).await;
        let (a, _) = items[0];
        let (_, y) = items[1];

        let err = carts
            .add(USER, add(RestaurantId::new(9999), y, 1))
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), RESTAURANT_NOT_FOUND);

        // Item exists, but belongs to another restaurant.
        let err = carts.add(USER, add(a, y, 1)).await.unwrap_err();
        assert_eq!(err.public_message(), MENU_ITEM_NOT_FOUND);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let carts = CartService::new(&store);
        let (a, x) = first_items(&store).await[0];

        carts.add(USER, add(a, x, 2)).await.unwrap();
        let cart = carts.update(USER, x, 0).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
    }

    #[tokio::test]
    async fn test_mutations_without_cart_are_not_found() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let carts = CartService::new(&store);

        for err in [
            carts.clear(USER).await.unwrap_err(),
            carts.remove(USER, MenuItemId::new(1)).await.unwrap_err(),
            carts.update(USER, MenuItemId::new(1), 2).await.unwrap_err(),
        ] {
            assert_eq!(err.public_message(), CART_NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_remove_missing_line() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let carts = CartService::new(&store);
        carts.get(USER).await.unwrap();

        let err = carts.remove(USER, MenuItemId::new(42)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Item not found in cart");
    }

    #[tokio::test]
    async fn test_clear_keeps_identity() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let carts = CartService::new(&store);
        let (a, x) = first_items(&store).await[0];

        let before = carts.add(USER, add(a, x, 1)).await.unwrap();
        let after = carts.clear(USER).await.unwrap();
        assert_eq!(before.id(), after.id());
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_writer_gets_conflict() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let carts = CartService::new(&store);
        let (a, x) = first_items(&store).await[0];

        let stale = carts.get(USER).await.unwrap();
        carts.add(USER, add(a, x, 1)).await.unwrap();

        let err = store.save_cart(&stale).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Stale(_)));
        assert_eq!(AppError::from(err).status(), StatusCode::CONFLICT);
    }
}
