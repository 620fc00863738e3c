//! In-process API tests.
//!
//! Each test builds the storefront router over an in-memory price source
//! and drives it with `tower::ServiceExt::oneshot`; no server or database
//! is needed.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::http::{Method, StatusCode};
use basketwise_core::deals::MAX_DEALS;
use basketwise_integration_tests::{
    TestApp, expired_token, many_deals_snapshot, sample_snapshot, token, token_with,
};
use basketwise_storefront::services::StaticPriceSource;
use serde_json::Value;

fn ids(list: &Value, field: &str) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|v| v[field].as_i64().unwrap())
        .collect()
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = TestApp::new(sample_snapshot());

    for (method, uri) in [
        (Method::POST, "/api/deals"),
        (Method::GET, "/api/prices"),
        (Method::POST, "/api/compare"),
    ] {
        let resp = app.send(method, uri, None, None).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(resp.text, "Unauthorized");
    }
}

#[tokio::test]
async fn test_bad_tokens_are_rejected() {
    let app = TestApp::new(sample_snapshot());
    let wrong_key = token_with(b"some-other-secret-entirely-different-x9", "x", 4_102_444_800);
    let expired = expired_token();

    for bad in [wrong_key.as_str(), expired.as_str(), "not-a-jwt"] {
        let resp = app.send(Method::GET, "/api/prices", Some(bad), None).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp.text, "Unauthorized");
    }
}

#[tokio::test]
async fn test_rejected_before_data_access() {
    // A failing source would give 500 if it were touched.
    let app = TestApp::with_source(Arc::new(StaticPriceSource::unavailable()));
    let resp = app.send(Method::POST, "/api/deals", None, Some("{}")).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_open() {
    let app = TestApp::new(sample_snapshot());
    let resp = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text, "ok");
}

// ============================================================================
// Deals
// ============================================================================

#[tokio::test]
async fn test_deals_sorted_by_savings() {
    let app = TestApp::new(sample_snapshot());
    let resp = app.post("/api/deals", "").await;
    assert_eq!(resp.status, StatusCode::OK);

    let deals = &resp.json["deals"];
    // Eggs@QuickBasket 14%, Bread@FreshMart 11%, Milk@FreshMart 6%, Milk@QuickBasket 3%
    assert_eq!(ids(deals, "productId"), vec![3, 2, 1, 1]);
    assert_eq!(ids(deals, "savingsPercent"), vec![14, 11, 6, 3]);

    let top = &deals[0];
    assert_eq!(top["productName"], "Eggs (6 pcs)");
    assert_eq!(top["storeName"], "QuickBasket");
    assert_eq!(top["originalPrice"].as_f64(), Some(42.0));
    assert_eq!(top["dealPrice"].as_f64(), Some(36.0));
    assert_eq!(top["savings"].as_f64(), Some(6.0));
    assert_eq!(top["quality"], "good");
    assert_eq!(deals[2]["quality"], "normal");
}

#[tokio::test]
async fn test_deals_filters() {
    let app = TestApp::new(sample_snapshot());

    let resp = app.post("/api/deals", r#"{"category":"dairy"}"#).await;
    assert_eq!(ids(&resp.json["deals"], "productId"), vec![3, 1, 1]);

    let resp = app.post("/api/deals", r#"{"maxPrice":40}"#).await;
    assert_eq!(ids(&resp.json["deals"], "productId"), vec![3, 2]);

    let resp = app.post("/api/deals", r#"{"category":"all"}"#).await;
    assert_eq!(resp.json["deals"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_deals_malformed_body_uses_defaults() {
    let app = TestApp::new(sample_snapshot());
    for body in ["{not json", r#"{"maxPrice":"cheap"}"#, "42"] {
        let resp = app.post("/api/deals", body).await;
        assert_eq!(resp.status, StatusCode::OK, "{body}");
        assert_eq!(resp.json["deals"].as_array().unwrap().len(), 4);
    }
}

#[tokio::test]
async fn test_deals_capped() {
    let app = TestApp::new(many_deals_snapshot(45));
    let resp = app.post("/api/deals", "{}").await;
    let percents = ids(&resp.json["deals"], "savingsPercent");
    assert_eq!(percents.len(), MAX_DEALS);
    assert!(percents.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_deals_upstream_failure_is_generic_500() {
    let app = TestApp::new(sample_snapshot());
    app.source.set_unavailable();

    let resp = app.post("/api/deals", "{}").await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text, "Internal server error");
}

// ============================================================================
// Prices
// ============================================================================

#[tokio::test]
async fn test_prices_unfiltered() {
    let app = TestApp::new(sample_snapshot());
    let resp = app.get("/api/prices").await;
    assert_eq!(resp.status, StatusCode::OK);

    assert_eq!(ids(&resp.json["products"], "id"), vec![1, 2, 3]);
    assert_eq!(ids(&resp.json["stores"], "id"), vec![1, 2]);
    assert_eq!(resp.json["meta"]["totalProducts"], 3);
    assert_eq!(resp.json["meta"]["totalStores"], 2);
    assert!(resp.json["meta"]["lastUpdated"].is_string());

    let eggs = &resp.json["products"][2];
    assert_eq!(eggs["priceRange"]["min"].as_f64(), Some(36.0));
    assert_eq!(eggs["priceRange"]["max"].as_f64(), Some(42.0));
    assert_eq!(eggs["prices"][1]["isAvailable"], true);
}

#[tokio::test]
async fn test_prices_filters() {
    let app = TestApp::new(sample_snapshot());

    let resp = app.get("/api/prices?category=DAIRY").await;
    assert_eq!(ids(&resp.json["products"], "id"), vec![1, 3]);
    assert_eq!(resp.json["meta"]["totalProducts"], 2);

    let resp = app.get("/api/prices?storeId=2").await;
    assert_eq!(ids(&resp.json["stores"], "id"), vec![2]);
    for product in resp.json["products"].as_array().unwrap() {
        assert_eq!(ids(&product["prices"], "storeId"), vec![2]);
    }

    let resp = app.get("/api/prices?productId=2").await;
    assert_eq!(ids(&resp.json["products"], "id"), vec![2]);

    // Unparseable ids are ignored.
    let resp = app.get("/api/prices?storeId=abc").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(ids(&resp.json["products"], "id"), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_prices_upstream_failure() {
    let app = TestApp::new(sample_snapshot());
    app.source.set_unavailable();
    let resp = app.get("/api/prices").await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text, "Internal server error");
}

// ============================================================================
// Compare
// ============================================================================

const CART: &str = r#"{"items":[{"productId":1,"quantity":2},{"productId":2,"quantity":1}]}"#;

#[tokio::test]
async fn test_compare_prefers_fully_available_store() {
    let app = TestApp::ready(sample_snapshot());
    let resp = app.post("/api/compare", CART).await;
    assert_eq!(resp.status, StatusCode::OK);

    let stores = &resp.json["stores"];
    assert_eq!(ids(stores, "storeId"), vec![1, 2]);

    assert_eq!(stores[0]["total"].as_f64(), Some(168.0));
    assert_eq!(stores[0]["fullyAvailable"], true);
    assert_eq!(stores[1]["total"].as_f64(), Some(132.0));
    assert_eq!(stores[1]["availableCount"], 1);
    assert_eq!(stores[1]["unavailableItems"][0], "Brown Bread");

    assert_eq!(resp.json["bestStore"]["storeName"], "FreshMart");
    // MRP: 66 * 2 + 45 = 177
    assert_eq!(resp.json["savings"].as_f64(), Some(9.0));
}

#[tokio::test]
async fn test_compare_empty_cart() {
    let app = TestApp::ready(sample_snapshot());
    let resp = app.post("/api/compare", r#"{"items":[]}"#).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["stores"].as_array().unwrap().len(), 0);
    assert!(resp.json["bestStore"].is_null());
    assert!(resp.json["savings"].is_null());
}

#[tokio::test]
async fn test_compare_bad_requests() {
    let app = TestApp::ready(sample_snapshot());
    for body in [
        r#"{"items":[{"productId":99,"quantity":1}]}"#,
        r#"{"items":[{"productId":1,"quantity":0}]}"#,
        "{not json",
    ] {
        let resp = app.post("/api/compare", body).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn test_compare_before_first_snapshot() {
    let app = TestApp::new(sample_snapshot());
    let resp = app.post("/api/compare", CART).await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);

    let resp = app.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_refresh_task_loads_live_snapshot() {
    let app = TestApp::new(sample_snapshot());
    let task = app
        .state
        .live()
        .spawn_refresh(app.state.prices_handle(), Duration::from_secs(3600));

    for _ in 0..50 {
        if app.state.live().is_ready() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    task.stop();

    let resp = app.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let resp = app.post("/api/compare", CART).await;
    assert_eq!(resp.status, StatusCode::OK);
}

// ============================================================================
// Middleware
// ============================================================================

#[tokio::test]
async fn test_response_headers() {
    let app = TestApp::new(sample_snapshot());
    let resp = app.get("/api/prices").await;

    assert_eq!(resp.headers["x-frame-options"], "DENY");
    assert_eq!(resp.headers["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers["cache-control"], "no-store");
    assert!(!resp.headers["x-request-id"].is_empty());
}

// ============================================================================
// Rate limiting
// ============================================================================

/// Burst allowed per client before the limiter answers 429.
const BURST: usize = 60;

#[tokio::test]
async fn test_limited_app_without_client_address_still_authenticates() {
    let app = TestApp::rate_limited(sample_snapshot());

    let resp = app.send(Method::GET, "/api/prices", None, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.text, "Unauthorized");

    let resp = app.get("/api/prices").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json["meta"]["totalProducts"], 3);
}

#[tokio::test]
async fn test_limited_app_throttles_forwarded_client() {
    let app = TestApp::rate_limited(sample_snapshot());
    let token = token();

    let mut statuses = Vec::new();
    for _ in 0..BURST + 20 {
        let resp = app
            .send_with(Method::GET, "/api/prices", Some(&token), None, |b| {
                b.header("x-forwarded-for", "203.0.113.9")
            })
            .await;
        statuses.push(resp.status);
    }

    assert!(statuses[..BURST].iter().all(|s| *s == StatusCode::OK));
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));

    // Other clients keep their own budget.
    let resp = app
        .send_with(Method::GET, "/api/prices", Some(&token), None, |b| {
            b.header("x-forwarded-for", "198.51.100.20")
        })
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_limited_app_keys_on_peer_address() {
    let app = TestApp::rate_limited(sample_snapshot());
    let token = token();
    let peer: SocketAddr = "192.0.2.44:40000".parse().unwrap();

    let mut throttled = false;
    for _ in 0..BURST + 20 {
        let resp = app
            .send_with(Method::GET, "/api/prices", Some(&token), None, |b| {
                b.extension(ConnectInfo(peer))
            })
            .await;
        assert_ne!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        throttled |= resp.status == StatusCode::TOO_MANY_REQUESTS;
    }
    assert!(throttled);
}
