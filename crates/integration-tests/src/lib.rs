//! Integration tests for Basketwise.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process API tests (no database needed)
//! cargo test -p basketwise-integration-tests
//!
//! # Smoke tests against a running server
//! STOREFRONT_BASE_URL=http://localhost:3000 STOREFRONT_JWT_SECRET=... \
//!     cargo test -p basketwise-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `api` - Router-level tests against an in-memory price source
//! - `live_server` - HTTP smoke tests against a running storefront
//!
//! This crate holds the shared fixtures: a small sample catalog, token
//! minting and a [`TestApp`] that drives the router without a socket.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header, request},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use basketwise_core::{PriceSnapshot, Product, ProductId, Store, StoreId, StoreQuote};
use basketwise_storefront::middleware::ApiClaims;
use basketwise_storefront::routes;
use basketwise_storefront::services::StaticPriceSource;
use basketwise_storefront::state::AppState;

/// HS256 secret shared by [`TestApp`] and [`token`].
pub const JWT_SECRET: &[u8] = b"integration-test-secret-k7Qw9zXr2mVb4nLp8sTd";

pub const FRESHMART: StoreId = StoreId::new(1);
pub const QUICKBASKET: StoreId = StoreId::new(2);

pub const MILK: ProductId = ProductId::new(1);
pub const BREAD: ProductId = ProductId::new(2);
pub const EGGS: ProductId = ProductId::new(3);

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Sign claims with `secret`.
pub fn token_with(secret: &[u8], sub: &str, exp: u64) -> String {
    let claims = ApiClaims {
        sub: sub.to_string(),
        exp,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .expect("token encodes")
}

/// A token valid for one hour.
pub fn token() -> String {
    token_with(JWT_SECRET, "test-client", now_secs() + 3600)
}

/// A token that expired an hour ago.
pub fn expired_token() -> String {
    token_with(JWT_SECRET, "test-client", now_secs().saturating_sub(3600))
}

pub fn store(id: StoreId, name: &str) -> Store {
    Store {
        id,
        name: name.to_string(),
        logo_url: Some(format!("https://cdn.example.com/{}.png", name.to_lowercase())),
        rating: Decimal::new(42, 1),
        delivery_fee: Decimal::from(25),
        min_order: Decimal::from(199),
    }
}

pub fn quote(
    product_id: ProductId,
    store_id: StoreId,
    price: i64,
    available: bool,
    discount: i64,
) -> StoreQuote {
    StoreQuote {
        product_id,
        store_id,
        price: Decimal::from(price),
        available,
        discount_percent: Decimal::from(discount),
        updated_at: None,
    }
}

pub fn product(
    id: ProductId,
    name: &str,
    category: &str,
    unit: &str,
    base_price: i64,
    quotes: Vec<StoreQuote>,
) -> Product {
    Product {
        id,
        name: name.to_string(),
        category: category.to_string(),
        unit: unit.to_string(),
        base_price: Decimal::from(base_price),
        image_url: None,
        quotes,
    }
}

/// Two stores, three products.
///
/// | product | MRP | `FreshMart`       | `QuickBasket`        |
/// |---------|-----|-------------------|----------------------|
/// | Milk    | 68  | 64 (5% off)       | 66 (3% off)          |
/// | Bread   | 45  | 40 (11% off)      | 45, unavailable      |
/// | Eggs    | 42  | 42                | 36 (14% off)         |
pub fn sample_snapshot() -> PriceSnapshot {
    PriceSnapshot::new(
        vec![
            product(
                MILK,
                "Toned Milk",
                "Dairy",
                "1 L",
                68,
                vec![
                    quote(MILK, FRESHMART, 64, true, 5),
                    quote(MILK, QUICKBASKET, 66, true, 3),
                ],
            ),
            product(
                BREAD,
                "Brown Bread",
                "Bakery",
                "400 g",
                45,
                vec![
                    quote(BREAD, FRESHMART, 40, true, 11),
                    quote(BREAD, QUICKBASKET, 45, false, 0),
                ],
            ),
            product(
                EGGS,
                "Eggs",
                "Dairy",
                "6 pcs",
                42,
                vec![
                    quote(EGGS, FRESHMART, 42, true, 0),
                    quote(EGGS, QUICKBASKET, 36, true, 14),
                ],
            ),
        ],
        vec![store(FRESHMART, "FreshMart"), store(QUICKBASKET, "QuickBasket")],
    )
}

/// `count` discounted products at one store, each with a distinct saving.
pub fn many_deals_snapshot(count: i32) -> PriceSnapshot {
    let products = (1..=count)
        .map(|i| {
            let id = ProductId::new(i);
            product(
                id,
                &format!("Item {i}"),
                "Staples",
                "1 kg",
                1000,
                vec![quote(id, FRESHMART, 1000 - i64::from(i), true, 1)],
            )
        })
        .collect();
    PriceSnapshot::new(products, vec![store(FRESHMART, "FreshMart")])
}

/// The storefront router over an in-memory price source.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub source: Arc<StaticPriceSource>,
}

impl TestApp {
    /// App whose source serves `snapshot`. The live snapshot is not loaded.
    pub fn new(snapshot: PriceSnapshot) -> Self {
        Self::with_source(Arc::new(StaticPriceSource::new(snapshot)))
    }

    /// App whose source serves `snapshot` with the live snapshot loaded.
    pub fn ready(snapshot: PriceSnapshot) -> Self {
        let app = Self::new(snapshot.clone());
        app.state.live().replace(snapshot);
        app
    }

    pub fn with_source(source: Arc<StaticPriceSource>) -> Self {
        let state = AppState::with_jwt_secret(JWT_SECRET, source.clone());
        Self {
            router: routes::app(state.clone()),
            state,
            source,
        }
    }

    /// The production router (rate limited `/api`) over `snapshot`.
    pub fn rate_limited(snapshot: PriceSnapshot) -> Self {
        let source = Arc::new(StaticPriceSource::new(snapshot));
        let state = AppState::with_jwt_secret(JWT_SECRET, source.clone());
        Self {
            router: routes::app_with_rate_limit(state.clone()),
            state,
            source,
        }
    }

    /// Send a request and return status, headers and the parsed JSON body
    /// (`Value::Null` when the body is not JSON).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<&str>,
    ) -> TestResponse {
        self.send_with(method, uri, bearer, body, |builder| builder)
            .await
    }

    /// Like [`send`](Self::send), with a hook to add headers or extensions.
    pub async fn send_with(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<&str>,
        customize: impl FnOnce(request::Builder) -> request::Builder,
    ) -> TestResponse {
        let mut builder = customize(Request::builder().method(method).uri(uri));
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            text: String::from_utf8_lossy(&bytes).into_owned(),
            json: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        }
    }

    /// Authenticated GET.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(&token()), None).await
    }

    /// Authenticated POST with a JSON body.
    pub async fn post(&self, uri: &str, body: &str) -> TestResponse {
        self.send(Method::POST, uri, Some(&token()), Some(body))
            .await
    }
}

/// A collected response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub text: String,
    pub json: Value,
}
