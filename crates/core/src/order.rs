//! Orders produced by checking out a cart.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cart::{Cart, CartLine};
use crate::types::{OrderId, OrderStatus, Price, RestaurantId, UserId};

/// Minutes quoted for delivery on every new order.
pub const DEFAULT_ESTIMATED_DELIVERY_MINUTES: i32 = 30;

/// Errors raised when turning a cart into an order.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Payment method or delivery address is missing or blank.
    #[error("Please provide payment method and delivery address")]
    MissingFields,

    /// No cart, or a cart with no lines.
    #[error("Your cart is empty")]
    EmptyCart,
}

/// An order ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub items: Vec<CartLine>,
    pub total_items: u64,
    pub total_price: Price,
    pub payment_method: String,
    pub delivery_address: String,
    pub status: OrderStatus,
    pub estimated_delivery_time: i32,
}

impl NewOrder {
    /// Check the payment and delivery fields before touching the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingFields`] if either value is absent or blank.
    pub fn validate_fields(
        payment_method: Option<&str>,
        delivery_address: Option<&str>,
    ) -> Result<(String, String), CheckoutError> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|s| !s.is_empty())
        }

        match (present(payment_method), present(delivery_address)) {
            (Some(p), Some(d)) => Ok((p.to_owned(), d.to_owned())),
            _ => Err(CheckoutError::MissingFields),
        }
    }

    /// Snapshot `cart` into an order.
    ///
    /// Lines and totals are copied by value, so clearing the cart afterwards
    /// does not affect the order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart has no lines.
    pub fn from_cart(
        cart: &Cart,
        payment_method: String,
        delivery_address: String,
    ) -> Result<Self, CheckoutError> {
        let restaurant_id = cart.restaurant_id().ok_or(CheckoutError::EmptyCart)?;

        Ok(Self {
            user_id: cart.user_id(),
            restaurant_id,
            items: cart.lines().to_vec(),
            total_items: cart.total_items(),
            total_price: cart.total_price(),
            payment_method,
            delivery_address,
            status: OrderStatus::Pending,
            estimated_delivery_time: DEFAULT_ESTIMATED_DELIVERY_MINUTES,
        })
    }

    /// Attach the identity and timestamps assigned by the store.
    #[must_use]
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            user_id: self.user_id,
            restaurant_id: self.restaurant_id,
            items: self.items,
            total_items: self.total_items,
            total_price: self.total_price,
            payment_method: self.payment_method,
            delivery_address: self.delivery_address,
            status: self.status,
            estimated_delivery_time: self.estimated_delivery_time,
            created_at,
            updated_at: created_at,
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub items: Vec<CartLine>,
    pub total_items: u64,
    pub total_price: Price,
    pub payment_method: String,
    pub delivery_address: String,
    pub status: OrderStatus,
    /// Minutes.
    pub estimated_delivery_time: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
