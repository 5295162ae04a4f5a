//! Development-only error detail.
//!
//! 5xx responses carry their internal error text as an [`ErrorDetail`]
//! extension. Outside development it is dropped; in development this
//! middleware copies it into the JSON body as `detail`.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::error::ErrorDetail;
use crate::state::AppState;

/// Error bodies are tiny; anything bigger is left alone.
const MAX_ERROR_BODY: usize = 64 * 1024;

pub async fn error_detail_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !state.config().environment.is_development() {
        return response;
    }
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let Ok(bytes) = to_bytes(body, MAX_ERROR_BODY).await else {
        return Response::from_parts(parts, Body::empty());
    };

    let body = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(mut map)) => {
            map.insert("detail".to_owned(), Value::String(detail));
            parts.headers.remove(axum::http::header::CONTENT_LENGTH);
            Body::from(Value::Object(map).to_string())
        }
        _ => Body::from(bytes),
    };
    Response::from_parts(parts, body)
}
