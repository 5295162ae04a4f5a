//! Authentication service.
//!
//! Password registration and login, plus bearer token verification.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenIssuer};

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use foodhub_core::Email;

use crate::db::{RepositoryError, Store};
use crate::models::{CurrentUser, NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash checked on logins for unknown emails, so they cost as much Argon2
/// work as a wrong password does.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("not-a-real-account-password").ok());

/// Raw registration input, as received.
#[derive(Debug, Default, Clone)]
pub struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Authentication service.
///
/// Handles user registration, login, and token verification.
pub struct AuthService<'a> {
    store: &'a dyn Store,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store, tokens: &'a TokenIssuer) -> Self {
        Self { store, tokens }
    }

    /// Register a new user and issue a token for them.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if name, email or password is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn register(&self, input: Registration) -> Result<(User, String), AuthError> {
        let (Some(name), Some(email), Some(password)) = (
            non_blank(input.name),
            non_blank(input.email),
            input.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::MissingFields);
        };

        let email = Email::parse(&email)?;
        validate_password(&password)?;
        let password_hash = hash_password(&password)?;

        let new_user = NewUser {
            name,
            email,
            phone: non_blank(input.phone),
            address: non_blank(input.address),
        };

        let user = self
            .store
            .create_user(&new_user, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.tokens.issue(user.id)?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` if either field is absent.
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or the
    /// password is wrong. Both cases are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<(User, String), AuthError> {
        let (Some(email), Some(password)) = (
            email.filter(|e| !e.trim().is_empty()),
            password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::MissingCredentials);
        };

        // A malformed email cannot belong to anyone.
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some((user, password_hash)) = self.store.user_with_password(&email).await? else {
            tracing::warn!("login for unknown email");
            if let Some(hash) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, hash);
            }
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &password_hash).inspect_err(|_| {
            tracing::warn!(user_id = %user.id, "login with wrong password");
        })?;

        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    /// Resolve a presented token to the user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` if no token was presented,
    /// `AuthError::InvalidToken` if it fails verification, and
    /// `AuthError::UserGone` if its subject was deleted.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<CurrentUser, AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NotLoggedIn)?;
        let claims = self.tokens.verify(token)?;

        self.store
            .user_by_id(claims.id)
            .await?
            .map(CurrentUser::from)
            .ok_or(AuthError::UserGone)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::db::MemoryStore;

    fn tokens() -> TokenIssuer {
        TokenIssuer::new(
            &SecretString::from("k9#Lm2$qP7!vX4@tR8&wZ1^nB6*cF3%hJ"),
            Duration::from_secs(3600),
        )
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            name: Some("Ada".to_owned()),
            email: Some(email.to_owned()),
            password: Some(password.to_owned()),
            ..Registration::default()
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_dummy_hash_is_a_real_argon2_hash() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        let parsed = PasswordHash::new(hash).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(verify_password("correct horse battery", hash).is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
    }

    #[tokio::test]
    async fn test_register_normalizes_email_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        let (user, token) = auth
            .register(registration(" Ada@Example.com ", "analytical"))
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "ada@example.com");
        assert_eq!(tokens.verify(&token).unwrap().id, user.id);

        let err = auth
            .register(registration("ada@example.com", "different1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_register_requires_fields() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        let mut input = registration("ada@example.com", "analytical");
        input.name = Some("   ".to_owned());
        assert!(matches!(
            auth.register(input).await,
            Err(AuthError::MissingFields)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        auth.register(registration("ada@example.com", "analytical"))
            .await
            .unwrap();

        let wrong_password = auth
            .login(Some("ada@example.com"), Some("not-it-at-all"))
            .await
            .unwrap_err();
        let unknown_email = auth
            .login(Some("bob@example.com"), Some("analytical"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.status(), unknown_email.status());
        assert_eq!(
            wrong_password.public_message(),
            unknown_email.public_message()
        );
        assert_eq!(wrong_password.public_message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        assert!(matches!(
            auth.login(Some("ada@example.com"), None).await,
            Err(AuthError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        let (user, token) = auth
            .register(registration("ada@example.com", "analytical"))
            .await
            .unwrap();

        let current = auth.authenticate(Some(&token)).await.unwrap();
        assert_eq!(current.id, user.id);

        assert!(matches!(
            auth.authenticate(None).await,
            Err(AuthError::NotLoggedIn)
        ));
        assert!(matches!(
            auth.authenticate(Some("loggedout")).await,
            Err(AuthError::InvalidToken(_))
        ));

        let orphan = tokens.issue(foodhub_core::UserId::new(999)).unwrap();
        assert!(matches!(
            auth.authenticate(Some(&orphan)).await,
            Err(AuthError::UserGone)
        ));
    }
}
