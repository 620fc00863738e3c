//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Rate limiting on `/api` (governor)
//!
//! Bearer authentication is an extractor ([`RequireBearer`]) rather than a
//! layer so `/health` stays open.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{ApiClaims, RequireBearer};
pub use rate_limit::{api_rate_limiter, rate_limited};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
