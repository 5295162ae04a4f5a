//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span carrying `request_id`)
//! 3. Request ID (reuse or mint `x-request-id`)
//! 4. CORS (only `FRONTEND_URL`, with credentials)
//! 5. Error detail (development only)
//! 6. Rate limiting on `/auth` (governor)
//!
//! Authentication is an extractor ([`RequireAuth`]), not a layer.

pub mod auth;
pub mod error_detail;
pub mod rate_limit;
pub mod request_id;

pub use auth::{RequireAuth, TOKEN_COOKIE};
pub use error_detail::error_detail_middleware;
pub use rate_limit::{auth_rate_limiter, rate_limit_envelope};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
