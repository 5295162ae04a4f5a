//! The JSON response envelope and extractors that fail into it.
//!
//! Successful responses look like
//! `{"status": "success", "data": ..., "results"?: n, "pagination"?: {...}}`.
//! Errors are rendered by [`AppError`]; the extractors here make sure
//! malformed bodies and path parameters end up there too, instead of as
//! axum's plain-text rejections.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};

use foodhub_core::Pagination;

use crate::error::AppError;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> Envelope<T> {
    const fn empty() -> Self {
        Self {
            status: "success",
            message: None,
            token: None,
            results: None,
            pagination: None,
            data: None,
        }
    }

    #[must_use]
    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::empty()
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl<T> Envelope<Vec<T>> {
    /// A list payload; `results` carries its length.
    #[must_use]
    pub fn list(items: Vec<T>) -> Self {
        Self {
            results: Some(items.len()),
            data: Some(items),
            ..Self::empty()
        }
    }
}

impl Envelope<()> {
    /// `{"status": "success"}` with nothing else.
    #[must_use]
    pub const fn ok() -> Self {
        Self::empty()
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::empty()
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// JSON body extractor that rejects with a 400 envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected request body");
                Err(AppError::BadRequest("Invalid request body".to_string()))
            }
        }
    }
}

/// Path extractor that rejects with a 400 envelope.
///
/// Ids are integers; anything else in their place is a client error, not a
/// missing resource.
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected path parameters");
                Err(AppError::BadRequest("Invalid id".to_string()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_carries_results() {
        let json = serde_json::to_value(Envelope::list(vec![1, 2, 3])).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["results"], 3);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn test_bare_success() {
        let json = serde_json::to_value(Envelope::ok()).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "success" }));

        let json = serde_json::to_value(Envelope::message("Review deleted successfully")).unwrap();
        assert_eq!(json["message"], "Review deleted successfully");
        assert!(json.get("data").is_none());
    }
}
