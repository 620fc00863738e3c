//! Per-client rate limiting for the price API using governor and
//! `tower_governor`.
//!
//! The UI polls prices on a timer and re-runs deal searches on every filter
//! change, so the budget is generous: a burst of 60 with one token
//! replenished per second.
//!
//! Clients are keyed by the first proxy header carrying a parseable IP, then
//! by the socket peer address (present when the server is run with
//! `into_make_service_with_connect_info`). A request with neither cannot be
//! attributed to anyone and skips the limiter.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    response::Response,
};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower::ServiceExt;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::state::AppState;

/// Proxy headers carrying the real client IP, most trusted first.
const CLIENT_IP_HEADERS: &[&str] = &[
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

/// Key extractor that reads the client IP from proxy headers (Cloudflare,
/// then standard forwarding headers, then Fly.io), falling back to the peer
/// address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &axum::http::Request<T>) -> Result<Self::Key, GovernorError> {
        client_key(req).ok_or(GovernorError::UnableToExtractKey)
    }
}

/// The rate-limit key for a request: proxy header IP, else peer IP.
pub fn client_key<T>(req: &axum::http::Request<T>) -> Option<IpAddr> {
    client_ip(req.headers()).or_else(|| {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

/// First parseable client IP in [`CLIENT_IP_HEADERS`] order.
///
/// `X-Forwarded-For` may hold a chain; the first entry is the client.
fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    })
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create the rate limiter for `/api`: burst of 60, one token per second.
///
/// # Panics
///
/// This function will not panic. `per_second(1)` and `burst_size(60)` are
/// positive, which `GovernorConfigBuilder` always accepts.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(1)
        .burst_size(60)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(60) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// The same routes with and without the limiter.
#[derive(Clone)]
struct ApiRouters {
    limited: Router,
    open: Router,
}

/// Wrap `routes` so identifiable clients go through [`api_rate_limiter`]
/// and unidentifiable ones are served directly.
///
/// The result is a plain service; mount it with `nest_service`.
pub fn rate_limited(routes: Router<AppState>, state: AppState) -> Router {
    let routers = ApiRouters {
        limited: routes
            .clone()
            .layer(api_rate_limiter())
            .with_state(state.clone()),
        open: routes.with_state(state),
    };
    Router::new().fallback(dispatch).with_state(routers)
}

async fn dispatch(State(routers): State<ApiRouters>, request: Request) -> Response {
    let router = if client_key(&request).is_some() {
        routers.limited
    } else {
        tracing::debug!("No client address, skipping rate limit");
        routers.open
    };
    router
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {})
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let map = headers(&[
            ("x-forwarded-for", "10.0.0.1"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        assert_eq!(client_ip(&map), "203.0.113.7".parse().ok());
    }

    #[test]
    fn test_forwarded_for_uses_first_hop() {
        let map = headers(&[("x-forwarded-for", "198.51.100.2, 10.0.0.1")]);
        assert_eq!(client_ip(&map), "198.51.100.2".parse().ok());
    }

    #[test]
    fn test_skips_unparseable_values() {
        let map = headers(&[("cf-connecting-ip", "garbage"), ("fly-client-ip", "2001:db8::1")]);
        assert_eq!(client_ip(&map), "2001:db8::1".parse().ok());
    }

    #[test]
    fn test_no_headers() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_client_key_falls_back_to_peer_address() {
        let peer: SocketAddr = "192.0.2.10:51000".parse().unwrap();
        let mut req = axum::http::Request::new(());
        assert_eq!(client_key(&req), None);

        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(client_key(&req), Some(peer.ip()));

        req.headers_mut()
            .insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_key(&req), "198.51.100.4".parse().ok());
    }
}
