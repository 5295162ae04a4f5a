//! The per-user shopping cart.
//!
//! A [`Cart`] owns its lines and keeps three rules at all times:
//!
//! - every line belongs to the same restaurant,
//! - `total_items` and `total_price` are recomputed from the lines after each
//!   mutation and cannot be set from outside,
//! - a line's quantity is always positive; updating it to zero or below
//!   removes the line,
//! - no line holds more than [`Quantity::MAX`] and the total never exceeds
//!   [`Price::MAX_TOTAL`].
//!
//! Persistence is optimistic: a cart carries the `version` it was loaded
//! at, and stores only write it back if nobody else bumped the version in
//! between.

use serde::{Deserialize, Serialize};

use crate::catalog::MenuItem;
use crate::types::{CartId, MenuItemId, Price, RestaurantId, UserId};

/// Errors raised by cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The cart already holds lines from another restaurant.
    #[error("Cannot add items from different restaurants to the same cart")]
    CrossRestaurant {
        /// Restaurant the cart is currently bound to.
        current: RestaurantId,
        /// Restaurant of the rejected item.
        requested: RestaurantId,
    },

    /// No line for this menu item.
    #[error("Item not found in cart")]
    LineNotFound(MenuItemId),

    /// Quantity for an add must be a positive integer.
    #[error("Quantity must be a positive integer")]
    InvalidQuantity,

    /// Quantity is above [`Quantity::MAX`].
    #[error("Quantity is too large")]
    QuantityOverflow,

    /// The cart total would exceed [`Price::MAX_TOTAL`].
    #[error("Cart total is too large")]
    TotalTooLarge,
}

/// A strictly positive line quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// One unit.
    pub const ONE: Self = Self(1);

    /// Most units a single line may hold.
    pub const MAX: Self = Self(10_000);

    /// The raw count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = CartError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(CartError::InvalidQuantity);
        }
        u32::try_from(value)
            .ok()
            .filter(|&q| q <= Self::MAX.0)
            .map(Self)
            .ok_or(CartError::QuantityOverflow)
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

/// One item in a cart.
///
/// Name, price and image are captured when the item is added and are not
/// refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
    pub quantity: Quantity,
}

impl CartLine {
    /// Snapshot a catalog item into a new line.
    #[must_use]
    pub fn capture(item: &MenuItem, quantity: Quantity) -> Self {
        Self {
            item_id: item.id,
            restaurant_id: item.restaurant_id,
            name: item.name.clone(),
            price: item.price,
            image: item.image.clone(),
            quantity,
        }
    }

    /// `quantity * price`, or `None` on overflow.
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        self.price.checked_times(self.quantity.get())
    }
}

/// Derived cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub items: u64,
    pub price: Price,
}

/// Recompute totals from a line list.
///
/// # Errors
///
/// Returns [`CartError::TotalTooLarge`] if the price total passes
/// [`Price::MAX_TOTAL`].
pub fn compute_totals(lines: &[CartLine]) -> Result<Totals, CartError> {
    let mut totals = Totals::default();
    for line in lines {
        totals.items += u64::from(line.quantity.get());
        totals.price = line
            .subtotal()
            .and_then(|subtotal| totals.price.checked_add(subtotal))
            .filter(|total| *total <= Price::MAX_TOTAL)
            .ok_or(CartError::TotalTooLarge)?;
    }
    Ok(totals)
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    id: CartId,
    user_id: UserId,
    #[serde(rename = "items")]
    lines: Vec<CartLine>,
    total_items: u64,
    total_price: Price,
    #[serde(skip)]
    version: i64,
}

impl Cart {
    /// A fresh cart with no lines.
    #[must_use]
    pub const fn empty(id: CartId, user_id: UserId) -> Self {
        Self {
            id,
            user_id,
            lines: Vec::new(),
            total_items: 0,
            total_price: Price::ZERO,
            version: 0,
        }
    }

    /// Rebuild a cart from stored lines. Totals are recomputed, never read.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalTooLarge`] if the lines add up past
    /// [`Price::MAX_TOTAL`].
    pub fn restore(
        id: CartId,
        user_id: UserId,
        lines: Vec<CartLine>,
        version: i64,
    ) -> Result<Self, CartError> {
        let totals = compute_totals(&lines)?;
        Ok(Self {
            id,
            user_id,
            lines,
            total_items: totals.items,
            total_price: totals.price,
            version,
        })
    }

    #[must_use]
    pub const fn id(&self) -> CartId {
        self.id
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub const fn total_items(&self) -> u64 {
        self.total_items
    }

    #[must_use]
    pub const fn total_price(&self) -> Price {
        self.total_price
    }

    /// Version the cart was loaded at.
    #[must_use]
    pub const fn version(&self) -> i64 {
        self.version
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Restaurant every line belongs to, or `None` for an empty cart.
    #[must_use]
    pub fn restaurant_id(&self) -> Option<RestaurantId> {
        self.lines.first().map(|l| l.restaurant_id)
    }

    /// Add `quantity` of `item`, merging with an existing line.
    ///
    /// # Errors
    ///
    /// - [`CartError::CrossRestaurant`] if the cart holds another restaurant's items.
    /// - [`CartError::QuantityOverflow`] if the merged quantity passes [`Quantity::MAX`].
    /// - [`CartError::TotalTooLarge`] if the new total passes [`Price::MAX_TOTAL`].
    ///
    /// The cart is unchanged on error.
    pub fn add_item(&mut self, item: &MenuItem, quantity: Quantity) -> Result<(), CartError> {
        if let Some(current) = self.restaurant_id()
            && current != item.restaurant_id
        {
            return Err(CartError::CrossRestaurant {
                current,
                requested: item.restaurant_id,
            });
        }

        let mut lines = self.lines.clone();
        if let Some(line) = lines.iter_mut().find(|l| l.item_id == item.id) {
            let merged = i64::from(line.quantity.get()) + i64::from(quantity.get());
            line.quantity = Quantity::try_from(merged)?;
        } else {
            lines.push(CartLine::capture(item, quantity));
        }

        self.commit(lines)
    }

    /// Set the quantity of an existing line. Zero or below removes it.
    ///
    /// # Errors
    ///
    /// - [`CartError::LineNotFound`] if the item is not in the cart.
    /// - [`CartError::QuantityOverflow`] if `quantity` passes [`Quantity::MAX`].
    /// - [`CartError::TotalTooLarge`] if the new total passes [`Price::MAX_TOTAL`].
    pub fn update_quantity(&mut self, item_id: MenuItemId, quantity: i64) -> Result<(), CartError> {
        let idx = self.position(item_id)?;

        let mut lines = self.lines.clone();
        if quantity <= 0 {
            lines.remove(idx);
        } else if let Some(line) = lines.get_mut(idx) {
            line.quantity = Quantity::try_from(quantity)?;
        }

        self.commit(lines)
    }

    /// Remove the line for `item_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if the item is not in the cart.
    pub fn remove_item(&mut self, item_id: MenuItemId) -> Result<CartLine, CartError> {
        let idx = self.position(item_id)?;
        let mut lines = self.lines.clone();
        let line = lines.remove(idx);
        self.commit(lines)?;
        Ok(line)
    }

    /// Drop every line. Identity and version are kept.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.total_items = 0;
        self.total_price = Price::ZERO;
    }

    fn position(&self, item_id: MenuItemId) -> Result<usize, CartError> {
        self.lines
            .iter()
            .position(|l| l.item_id == item_id)
            .ok_or(CartError::LineNotFound(item_id))
    }

    fn commit(&mut self, lines: Vec<CartLine>) -> Result<(), CartError> {
        let totals = compute_totals(&lines)?;
        self.lines = lines;
        self.total_items = totals.items;
        self.total_price = totals.price;
        Ok(())
    }
}
