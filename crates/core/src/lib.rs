//! FoodHub Core - Shared domain library.
//!
//! This crate provides the types and rules used across all FoodHub components:
//! - `api` - The HTTP/JSON service
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain logic - no I/O, no
//! database access, no HTTP. Cart mutations, checkout snapshots and review
//! validation live here so every store backend enforces them identically.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`catalog`] - Restaurants, menu items, listing queries and pagination
//! - [`cart`] - The cart aggregate and its invariants
//! - [`order`] - Cart-to-order transition
//! - [`review`] - Ratings and review drafts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod order;
pub mod review;
pub mod types;

pub use cart::{Cart, CartError, CartLine, Quantity, Totals, compute_totals};
pub use catalog::{
    CatalogSeed, MenuItem, MenuItemSeed, PageRef, Pagination, Restaurant, RestaurantQuery,
    RestaurantSeed, RestaurantSort,
};
pub use order::{CheckoutError, NewOrder, Order};
pub use review::{Rating, Review, ReviewDraft, ReviewError};
pub use types::*;
