//! Checkout: turn the caller's cart into an order.
//!
//! The order insert and the cart reset are one store call guarded by the
//! cart version. Replaying a checkout that already went through therefore
//! finds an empty cart instead of creating a second order.

use tracing::instrument;

use foodhub_core::{CheckoutError, NewOrder, Order, OrderId, UserId};

use crate::db::{RepositoryError, Store};
use crate::error::{AppError, Result};
use crate::models::CurrentUser;

pub const ORDER_NOT_FOUND: &str = "Order not found";
pub const ORDER_FORBIDDEN: &str = "You are not authorized to view this order";

pub struct CheckoutService<'a> {
    store: &'a dyn Store,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Place an order from the caller's cart and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingFields` for a blank payment method or
    /// address, `CheckoutError::EmptyCart` when there is nothing to order,
    /// and `RepositoryError::Stale` if the cart changed mid-checkout.
    #[instrument(skip(self, delivery_address))]
    pub async fn place(
        &self,
        user_id: UserId,
        payment_method: Option<&str>,
        delivery_address: Option<&str>,
    ) -> Result<Order> {
        let (payment_method, delivery_address) =
            NewOrder::validate_fields(payment_method, delivery_address)?;

        let cart = self
            .store
            .cart_for_user(user_id)
            .await?
            .ok_or(CheckoutError::EmptyCart)?;
        let new_order = NewOrder::from_cart(&cart, payment_method, delivery_address)?;

        match self.store.place_order(&cart, new_order).await {
            Ok(order) => {
                tracing::info!(
                    order_id = %order.id,
                    total_items = order.total_items,
                    total_price = %order.total_price,
                    "order placed"
                );
                Ok(order)
            }
            Err(RepositoryError::Stale(what)) => {
                // A concurrent checkout of the same cart won.
                let emptied = self
                    .store
                    .cart_for_user(user_id)
                    .await?
                    .is_none_or(|c| c.is_empty());
                if emptied {
                    Err(CheckoutError::EmptyCart.into())
                } else {
                    Err(RepositoryError::Stale(what).into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// An order, visible to its owner and to admins.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::Forbidden`.
    pub async fn order(&self, caller: &CurrentUser, id: OrderId) -> Result<Order> {
        let order = self
            .store
            .order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(ORDER_NOT_FOUND.to_string()))?;

        if !caller.can_access(order.user_id) {
            return Err(AppError::Forbidden(ORDER_FORBIDDEN.to_string()));
        }
        Ok(order)
    }

    /// The caller's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(user_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use foodhub_core::{Email, OrderStatus, Price, Quantity, RestaurantQuery, Role};

    use super::*;
    use crate::db::memory::sample_catalog;
    use crate::db::{CatalogStore, MemoryStore};
    use crate::services::cart::{AddItem, CartService};

    fn caller(id: i32, role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            name: "Sam".to_string(),
            email: Email::parse("sam@example.com").unwrap(),
            role,
        }
    }

    async fn fill_cart(store: &MemoryStore, user_id: UserId, quantity: i64) {
        let (restaurants, _) = store
            .list_restaurants(&RestaurantQuery::default())
            .await
            .unwrap();
        let item = store.menu(restaurants[0].id).await.unwrap().remove(0);
        CartService::new(store)
            .add(
                user_id,
                AddItem {
                    restaurant_id: restaurants[0].id,
                    item_id: item.id,
                    quantity: Quantity::try_from(quantity).unwrap(),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_place_snapshots_and_clears_cart() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let user = UserId::new(100);
        fill_cart(&store, user, 3).await;

        let checkout = CheckoutService::new(&store);
        let order = checkout
            .place(user, Some("card"), Some("1 Elm St"))
            .await
            .unwrap();

        assert_eq!(order.total_items, 3);
        assert_eq!(order.total_price, Price::from_cents(3000));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.estimated_delivery_time, 30);

        let cart = CartService::new(&store).get(user).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Price::ZERO);
    }

    #[tokio::test]
    async fn test_empty_cart_creates_no_order() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let user = UserId::new(100);
        let checkout = CheckoutService::new(&store);

        // No cart at all.
        let err = checkout
            .place(user, Some("card"), Some("1 Elm St"))
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Your cart is empty");

        // Cart exists but has no lines.
        CartService::new(&store).get(user).await.unwrap();
        assert!(checkout.place(user, Some("card"), Some("1 Elm St")).await.is_err());
        assert!(checkout.orders(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_checked_first() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let checkout = CheckoutService::new(&store);
        let err = checkout
            .place(UserId::new(1), Some("card"), Some("   "))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.public_message(),
            "Please provide payment method and delivery address"
        );
    }

    #[tokio::test]
    async fn test_order_visibility() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let owner = UserId::new(100);
        fill_cart(&store, owner, 1).await;
        let checkout = CheckoutService::new(&store);
        let order = checkout.place(owner, Some("cash"), Some("home")).await.unwrap();

        assert!(checkout.order(&caller(100, Role::User), order.id).await.is_ok());
        assert!(checkout.order(&caller(7, Role::Admin), order.id).await.is_ok());

        let err = checkout
            .order(&caller(7, Role::User), order.id)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = checkout
            .order(&caller(100, Role::User), OrderId::new(424_242))
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), ORDER_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_orders_newest_first() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let user = UserId::new(100);
        let checkout = CheckoutService::new(&store);

        fill_cart(&store, user, 1).await;
        let first = checkout.place(user, Some("card"), Some("a")).await.unwrap();
        fill_cart(&store, user, 2).await;
        let second = checkout.place(user, Some("card"), Some("b")).await.unwrap();

        let orders = checkout.orders(user).await.unwrap();
        assert_eq!(
            orders.iter().map(|o| o.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
    }
}
