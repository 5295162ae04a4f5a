//! Domain models owned by the API crate.
//!
//! Catalog, cart, order and review types live in `foodhub-core`; accounts
//! and request identity live here because only the API deals with them.

pub mod identity;
pub mod user;

pub use identity::CurrentUser;
pub use user::{NewUser, User};
