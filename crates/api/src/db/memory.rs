//! In-memory store for tests and local fixtures.
//!
//! Everything lives behind one `RwLock`, so each trait call is atomic with
//! respect to the others; that is what makes the cart compare-and-swap and
//! the checkout transaction hold here. Not meant for production: nothing is
//! persisted.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use foodhub_core::{
    Cart, CartId, CartLine, CatalogSeed, Email, MenuItem, MenuItemId, NewOrder, Order, OrderId,
    Restaurant, RestaurantId, RestaurantQuery, RestaurantSeed, RestaurantSort, Review, ReviewDraft,
    ReviewId, Role, UserId,
};

use super::{
    CartStore, CatalogStore, OrderStore, RepositoryError, ReviewStore, Store, UserStore,
};
use crate::models::CurrentUser;
use crate::models::user::{NewUser, User};

#[derive(Debug)]
struct StoredCart {
    id: CartId,
    lines: Vec<CartLine>,
    version: i64,
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<(User, String)>,
    restaurants: Vec<Restaurant>,
    menu_items: Vec<MenuItem>,
    carts: HashMap<UserId, StoredCart>,
    orders: Vec<Order>,
    reviews: HashMap<(RestaurantId, UserId), Review>,
    next_id: i32,
}

impl Inner {
    const fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_restaurant(&mut self, seed: &RestaurantSeed) -> (Restaurant, Vec<MenuItem>) {
        let restaurant = Restaurant {
            id: RestaurantId::new(self.next_id()),
            name: seed.name.clone(),
            cuisine: seed.cuisine.clone(),
            rating: seed.rating,
            delivery_time: seed.delivery_time,
            price_range: seed.price_range.clone(),
            image: seed.image.clone(),
            address: seed.address.clone(),
            description: seed.description.clone(),
            is_open: seed.is_open,
            created_at: Utc::now(),
        };

        let mut menu = Vec::with_capacity(seed.menu.len());
        for item in &seed.menu {
            menu.push(MenuItem {
                id: MenuItemId::new(self.next_id()),
                restaurant_id: restaurant.id,
                name: item.name.clone(),
                price: item.price,
                description: item.description.clone(),
                image: item.image.clone(),
                category: item.category.clone(),
                is_popular: item.is_popular,
            });
        }

        self.restaurants.push(restaurant.clone());
        self.menu_items.extend(menu.iter().cloned());
        (restaurant, menu)
    }

    fn cart_of(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        self.carts
            .get(&user_id)
            .map(|c| restore_cart(c, user_id))
            .transpose()
    }
}

fn restore_cart(stored: &StoredCart, user_id: UserId) -> Result<Cart, RepositoryError> {
    Cart::restore(stored.id, user_id, stored.lines.clone(), stored.version)
        .map_err(|e| RepositoryError::DataCorruption(format!("cart {}: {e}", stored.id)))
}

/// Store keeping all state in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with a catalog fixture.
    #[must_use]
    pub fn with_catalog(seed: &CatalogSeed) -> Self {
        let mut inner = Inner::default();
        for restaurant in &seed.restaurants {
            inner.insert_restaurant(restaurant);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        user: &NewUser,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let created = User {
            id: UserId::new(inner.next_id()),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            role: Role::User,
            created_at: Utc::now(),
        };
        inner.users.push((created.clone(), password_hash.to_owned()));
        Ok(created)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|(u, _)| u.id == id)
            .map(|(u, _)| u.clone()))
    }

    async fn user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|(u, _)| u.email == *email).cloned())
    }

    async fn set_role(&self, email: &Email, role: Role) -> Result<User, RepositoryError> {
        let mut inner = self.inner.write().await;
        let (user, _) = inner
            .users
            .iter_mut()
            .find(|(u, _)| u.email == *email)
            .ok_or(RepositoryError::NotFound)?;
        user.role = role;
        Ok(user.clone())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_restaurants(
        &self,
        query: &RestaurantQuery,
    ) -> Result<(Vec<Restaurant>, u64), RepositoryError> {
        let inner = self.inner.read().await;
        let mut matches: Vec<&Restaurant> = inner
            .restaurants
            .iter()
            .filter(|r| query.matches(r))
            .collect();

        match query.sort {
            Some(RestaurantSort::RatingDesc) => matches.sort_by(|a, b| {
                b.rating
                    .total_cmp(&a.rating)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            Some(RestaurantSort::DeliveryTimeAsc) => {
                matches.sort_by_key(|r| (r.delivery_time, r.id));
            }
            None => matches.sort_by_key(|r| r.id),
        }

        let total = matches.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let page = matches
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.restaurants.iter().find(|r| r.id == id).cloned())
    }

    async fn menu(&self, restaurant_id: RestaurantId) -> Result<Vec<MenuItem>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .menu_items
            .iter()
            .filter(|m| m.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn menu_item(
        &self,
        restaurant_id: RestaurantId,
        item_id: MenuItemId,
    ) -> Result<Option<MenuItem>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .menu_items
            .iter()
            .find(|m| m.id == item_id && m.restaurant_id == restaurant_id)
            .cloned())
    }

    async fn insert_restaurant(
        &self,
        seed: &RestaurantSeed,
    ) -> Result<(Restaurant, Vec<MenuItem>), RepositoryError> {
        Ok(self.inner.write().await.insert_restaurant(seed))
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        self.inner.read().await.cart_of(user_id)
    }

    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut inner = self.inner.write().await;
        if let Some(cart) = inner.cart_of(user_id)? {
            return Ok(cart);
        }
        let id = CartId::new(inner.next_id());
        inner.carts.insert(
            user_id,
            StoredCart {
                id,
                lines: Vec::new(),
                version: 0,
            },
        );
        Ok(Cart::empty(id, user_id))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<Cart, RepositoryError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .carts
            .get_mut(&cart.user_id())
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != cart.version() {
            return Err(RepositoryError::Stale(format!("cart {}", cart.id())));
        }

        stored.lines = cart.lines().to_vec();
        stored.version += 1;
        restore_cart(stored, cart.user_id())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place_order(&self, cart: &Cart, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .carts
            .get_mut(&cart.user_id())
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != cart.version() {
            return Err(RepositoryError::Stale(format!("cart {}", cart.id())));
        }
        stored.lines.clear();
        stored.version += 1;

        let id = OrderId::new(inner.next_id());
        let placed = order.into_order(id, Utc::now());
        inner.orders.push(placed.clone());
        Ok(placed)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn reviews_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn upsert_review(
        &self,
        restaurant_id: RestaurantId,
        author: &CurrentUser,
        draft: &ReviewDraft,
    ) -> Result<Review, RepositoryError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        let key = (restaurant_id, author.id);
        if let Some(existing) = inner.reviews.get_mut(&key) {
            existing.user_name.clone_from(&author.name);
            existing.rating = draft.rating;
            existing.comment.clone_from(&draft.comment);
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let review = Review {
            id: ReviewId::new(inner.next_id()),
            restaurant_id,
            user_id: author.id,
            user_name: author.name.clone(),
            rating: draft.rating,
            comment: draft.comment.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.reviews.insert(key, review.clone());
        Ok(review)
    }

    async fn review(
        &self,
        restaurant_id: RestaurantId,
        review_id: ReviewId,
    ) -> Result<Option<Review>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .values()
            .find(|r| r.id == review_id && r.restaurant_id == restaurant_id)
            .cloned())
    }

    async fn delete_review(
        &self,
        restaurant_id: RestaurantId,
        review_id: ReviewId,
    ) -> Result<bool, RepositoryError> {
        let mut inner = self.inner.write().await;
        let key = inner
            .reviews
            .iter()
            .find(|(_, r)| r.id == review_id && r.restaurant_id == restaurant_id)
            .map(|(key, _)| *key);
        Ok(key.is_some_and(|key| inner.reviews.remove(&key).is_some()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Three small restaurants with one dish each.
#[cfg(test)]
pub(crate) fn sample_catalog() -> CatalogSeed {
    let restaurant = |name: &str, cuisine: &str, rating: f64, delivery_time: i32| RestaurantSeed {
        name: name.to_owned(),
        cuisine: cuisine.to_owned(),
        rating,
        delivery_time,
        price_range: None,
        image: None,
        address: "1 Main St".to_owned(),
        description: None,
        is_open: true,
        menu: vec![foodhub_core::MenuItemSeed {
            name: format!("{name} special"),
            price: foodhub_core::Price::from_cents(1000),
            description: None,
            image: None,
            category: None,
            is_popular: false,
        }],
    };
    CatalogSeed {
        restaurants: vec![
            restaurant("Pasta Place", "Italian", 4.1, 35),
            restaurant("Sushi Bar", "Japanese", 4.8, 40),
            restaurant("Taco Stand", "Mexican", 3.9, 15),
        ],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use foodhub_core::{Price, Quantity};

    use super::*;

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(
                &NewUser {
                    name: "Kim".to_owned(),
                    email: Email::parse(email).unwrap(),
                    phone: None,
                    address: None,
                },
                "hash",
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_sorts_and_pages() {
        let store = MemoryStore::with_catalog(&sample_catalog());

        let by_rating = RestaurantQuery {
            sort: Some(RestaurantSort::RatingDesc),
            limit: 2,
            ..RestaurantQuery::default()
        };
        let (page, total) = store.list_restaurants(&by_rating).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "Sushi Bar");

        let fastest = RestaurantQuery {
            sort: Some(RestaurantSort::DeliveryTimeAsc),
            ..RestaurantQuery::default()
        };
        let (page, _) = store.list_restaurants(&fastest).await.unwrap();
        assert_eq!(page[0].name, "Taco Stand");

        let second_page = RestaurantQuery {
            page: 2,
            limit: 2,
            ..RestaurantQuery::default()
        };
        let (page, total) = store.list_restaurants(&second_page).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_menu_item_scoped_to_restaurant() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let (restaurants, _) = store
            .list_restaurants(&RestaurantQuery::default())
            .await
            .unwrap();
        let first = restaurants[0].id;
        let second = restaurants[1].id;
        let item = store.menu(first).await.unwrap().remove(0);

        assert!(store.menu_item(first, item.id).await.unwrap().is_some());
        assert!(store.menu_item(second, item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        user(&store, "kim@example.com").await;
        let err = store
            .create_user(
                &NewUser {
                    name: "Other".to_owned(),
                    email: Email::parse("kim@example.com").unwrap(),
                    phone: None,
                    address: None,
                },
                "hash",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_save_cart_rejects_stale_version() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let kim = user(&store, "kim@example.com").await;
        let (restaurants, _) = store
            .list_restaurants(&RestaurantQuery::default())
            .await
            .unwrap();
        let item = store.menu(restaurants[0].id).await.unwrap().remove(0);

        let mut first = store.get_or_create_cart(kim.id).await.unwrap();
        let mut second = first.clone();

        first.add_item(&item, Quantity::ONE).unwrap();
        let saved = store.save_cart(&first).await.unwrap();
        assert_eq!(saved.version(), 1);

        second.add_item(&item, Quantity::ONE).unwrap();
        let err = store.save_cart(&second).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Stale(_)));

        let current = store.cart_for_user(kim.id).await.unwrap().unwrap();
        assert_eq!(current.total_items(), 1);
    }

    #[tokio::test]
    async fn test_place_order_clears_cart_once() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let kim = user(&store, "kim@example.com").await;
        let (restaurants, _) = store
            .list_restaurants(&RestaurantQuery::default())
            .await
            .unwrap();
        let item = store.menu(restaurants[0].id).await.unwrap().remove(0);

        let mut cart = store.get_or_create_cart(kim.id).await.unwrap();
        cart.add_item(&item, Quantity::try_from(2_i64).unwrap()).unwrap();
        let cart = store.save_cart(&cart).await.unwrap();

        let order = NewOrder::from_cart(&cart, "card".into(), "home".into()).unwrap();
        let placed = store.place_order(&cart, order.clone()).await.unwrap();
        assert_eq!(placed.total_price, Price::from_cents(2000));

        // Replaying the same snapshot must not create a second order.
        assert!(matches!(
            store.place_order(&cart, order).await,
            Err(RepositoryError::Stale(_))
        ));
        assert_eq!(store.orders_for_user(kim.id).await.unwrap().len(), 1);
        assert!(
            store
                .cart_for_user(kim.id)
                .await
                .unwrap()
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_upsert_review_keeps_identity() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let author = CurrentUser::from(user(&store, "kim@example.com").await);
        let restaurant = RestaurantId::new(1);
        let draft = |rating: i64, comment: &str| ReviewDraft {
            rating: foodhub_core::Rating::new(rating).unwrap(),
            comment: comment.to_owned(),
        };

        let first = store
            .upsert_review(restaurant, &author, &draft(2, "meh"))
            .await
            .unwrap();
        let second = store
            .upsert_review(restaurant, &author, &draft(5, "much better"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        let all = store.reviews_for_restaurant(restaurant).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rating.get(), 5);
    }

    #[tokio::test]
    async fn test_reviews_keyed_per_author_and_restaurant() {
        let store = MemoryStore::with_catalog(&sample_catalog());
        let kim = CurrentUser::from(user(&store, "kim@example.com").await);
        let lee = CurrentUser::from(user(&store, "lee@example.com").await);
        let draft = ReviewDraft {
            rating: foodhub_core::Rating::new(4).unwrap(),
            comment: "good".to_owned(),
        };

        let kims = store
            .upsert_review(RestaurantId::new(1), &kim, &draft)
            .await
            .unwrap();
        store
            .upsert_review(RestaurantId::new(1), &lee, &draft)
            .await
            .unwrap();
        store
            .upsert_review(RestaurantId::new(3), &kim, &draft)
            .await
            .unwrap();

        assert_eq!(
            store
                .reviews_for_restaurant(RestaurantId::new(1))
                .await
                .unwrap()
                .len(),
            2
        );

        // Wrong restaurant does not delete.
        assert!(!store
            .delete_review(RestaurantId::new(3), kims.id)
            .await
            .unwrap());
        assert!(store
            .delete_review(RestaurantId::new(1), kims.id)
            .await
            .unwrap());
        assert!(store
            .review(RestaurantId::new(1), kims.id)
            .await
            .unwrap()
            .is_none());

        // Kim can review the restaurant again after deleting.
        let again = store
            .upsert_review(RestaurantId::new(1), &kim, &draft)
            .await
            .unwrap();
        assert_ne!(again.id, kims.id);
    }
}
