//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] foodhub_core::EmailError),

    /// Login without email or password.
    #[error("missing credentials")]
    MissingCredentials,

    /// Registration without name, email or password.
    #[error("missing registration fields")]
    MissingFields,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// No token on the request.
    #[error("no token presented")]
    NotLoggedIn,

    /// Token malformed, badly signed or expired.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token subject was deleted.
    #[error("token subject no longer exists")]
    UserGone,

    /// Token could not be signed.
    #[error("token signing failed: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEmail(_)
            | Self::MissingCredentials
            | Self::MissingFields
            | Self::UserAlreadyExists
            | Self::WeakPassword(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::NotLoggedIn | Self::InvalidToken(_) | Self::UserGone => {
                StatusCode::UNAUTHORIZED
            }
            Self::TokenSigning(_) | Self::Repository(_) | Self::PasswordHash => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message.
    ///
    /// Unknown email and wrong password share one message.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please provide a valid email address",
            Self::MissingCredentials => "Please provide email and password",
            Self::MissingFields => "Please provide name, email and password",
            Self::InvalidCredentials => "Invalid credentials",
            Self::UserAlreadyExists => "User with that email already exists",
            Self::WeakPassword(msg) => return msg.clone(),
            Self::NotLoggedIn => "You are not logged in. Please log in to get access.",
            Self::InvalidToken(_) => "Invalid token or expired. Please log in again.",
            Self::UserGone => "The user belonging to this token no longer exists.",
            Self::TokenSigning(_) | Self::Repository(_) | Self::PasswordHash => {
                "Internal server error"
            }
        }
        .to_string()
    }
}
