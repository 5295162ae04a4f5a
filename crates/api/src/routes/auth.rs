//! Auth route handlers.
//!
//! Tokens are returned in the body and also set as an http-only `jwt`
//! cookie, so both API clients and browsers work.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};
use tracing::instrument;

use crate::envelope::{ApiJson, Envelope};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, TOKEN_COOKIE};
use crate::models::CurrentUser;
use crate::services::{AuthService, Registration};
use crate::state::AppState;

/// Cookie value written on logout.
const LOGGED_OUT: &str = "loggedout";
/// Lifetime of the logout cookie.
const LOGGED_OUT_SECONDS: i64 = 10;

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `data` payload of the auth endpoints.
#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: CurrentUser,
}

fn session_cookie(state: &AppState, value: String, max_age_secs: i64) -> String {
    Cookie::build((TOKEN_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(!state.config().environment.is_development())
        .max_age(Duration::seconds(max_age_secs))
        .build()
        .to_string()
}

fn token_max_age(state: &AppState) -> i64 {
    i64::try_from(state.tokens().ttl().as_secs()).unwrap_or(i64::MAX)
}

/// Handle registration.
#[instrument(skip(state, form), fields(email = ?form.email))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> Result<impl IntoResponse> {
    let (user, token) = AuthService::new(state.store(), state.tokens())
        .register(Registration {
            name: form.name,
            email: form.email,
            password: form.password,
            phone: form.phone,
            address: form.address,
        })
        .await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    let cookie = session_cookie(&state, token.clone(), token_max_age(&state));

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Envelope::data(UserPayload {
            user: CurrentUser::from(user),
        })
        .with_token(token),
    ))
}

/// Handle login.
#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginForm>,
) -> Result<impl IntoResponse> {
    let (user, token) = AuthService::new(state.store(), state.tokens())
        .login(form.email.as_deref(), form.password.as_deref())
        .await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "user logged in");
    let cookie = session_cookie(&state, token.clone(), token_max_age(&state));

    Ok((
        [(header::SET_COOKIE, cookie)],
        Envelope::data(UserPayload {
            user: CurrentUser::from(user),
        })
        .with_token(token),
    ))
}

/// The caller's public profile.
pub async fn me(RequireAuth(user): RequireAuth) -> Envelope<UserPayload> {
    Envelope::data(UserPayload { user })
}

/// Overwrite the session cookie. Bearer tokens stay valid until they expire.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    clear_sentry_user();
    let cookie = session_cookie(&state, LOGGED_OUT.to_owned(), LOGGED_OUT_SECONDS);
    ([(header::SET_COOKIE, cookie)], Envelope::ok())
}
