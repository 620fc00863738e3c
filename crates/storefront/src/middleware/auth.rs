//! Bearer-token authentication.
//!
//! API requests carry `Authorization: Bearer <jwt>`, an HS256 token signed
//! with the storefront's JWT secret. The extractor runs before the handler
//! body, so a rejected request never touches price data.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{Algorithm, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Claims carried by an API token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiClaims {
    /// Subject (user or client id).
    pub sub: String,
    /// Expiry as a Unix timestamp.
    pub exp: u64,
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireBearer(claims): RequireBearer) -> impl IntoResponse {
///     format!("Hello, {}!", claims.sub)
/// }
/// ```
pub struct RequireBearer(pub ApiClaims);

impl FromRequestParts<AppState> for RequireBearer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<ApiClaims>(token, state.decoding_key(), &validation).map_err(|e| {
            debug!(error = %e, "Bearer token rejected");
            AppError::Unauthorized(format!("invalid bearer token: {e}"))
        })?;

        tracing::Span::current().record("client", data.claims.sub.as_str());
        Ok(Self(data.claims))
    }
}

/// Pull the token out of an `Authorization: Bearer ...` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
