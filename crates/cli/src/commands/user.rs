//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! foodhub-cli user promote -e admin@example.com -r admin
//! ```
//!
//! Admin accounts cannot be created over HTTP; register normally, then
//! promote.

use foodhub_api::db::{PgStore, RepositoryError, UserStore};
use foodhub_core::{Email, Role};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: user, admin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No such user.
    #[error("No user registered with email: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Set the role of an existing user.
///
/// # Returns
///
/// The ID of the updated user.
pub async fn promote(email: &str, role: &str) -> Result<i32, UserError> {
    let role: Role = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;

    let store = PgStore::new(connect().await?);

    tracing::info!("Setting role of {} to {}", email, role);
    let user = store.set_role(&email, role).await.map_err(|e| match e {
        RepositoryError::NotFound => UserError::NotFound(email.to_string()),
        other => UserError::Repository(other),
    })?;

    tracing::info!(
        "User updated successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id.as_i32())
}
