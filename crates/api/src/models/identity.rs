//! The authenticated caller, threaded through handlers as a typed value.

use serde::Serialize;

use foodhub_core::{Email, Role, UserId};

use crate::error::AppError;
use crate::models::user::User;

/// Message for callers whose role is not allowed.
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action";

/// Public profile of the authenticated user.
///
/// Also the `data.user` payload of the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Owners and admins may access a resource owned by `owner`.
    #[must_use]
    pub fn can_access(&self, owner: UserId) -> bool {
        self.id == owner || self.is_admin()
    }

    /// Reject the caller unless their role is in `roles`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` otherwise.
    pub fn restrict_to(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(PERMISSION_DENIED.to_string()))
        }
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        user.clone().into()
    }
}
