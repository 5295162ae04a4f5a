//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use foodhub_core::{Email, Role, UserId};

/// A registered account (domain type).
///
/// The password hash is never part of this type; stores hand it out
/// separately and only to the login path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name, copied onto reviews.
    pub name: String,
    /// Login key, normalized.
    pub email: Email,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// A validated registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub address: Option<String>,
}
