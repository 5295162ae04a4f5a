//! Business logic services for the API.
//!
//! Each service borrows the shared [`Store`](crate::db::Store) for the length
//! of one request; handlers build them on the fly from [`AppState`](crate::state::AppState).
//!
//! # Services
//!
//! - `auth` - Registration, login, token verification
//! - `catalog` - Restaurant listing, lookup, administration
//! - `cart` - The per-user cart
//! - `checkout` - Cart-to-order transition and order lookup
//! - `reviews` - One review per (restaurant, user)

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod reviews;

pub use auth::{AuthService, Registration};
pub use cart::{AddItem, CartService};
pub use catalog::{CatalogService, validate_seed};
pub use checkout::CheckoutService;
pub use reviews::ReviewService;
