//! End-to-end tests for the storefront API router
//!
//! Requests are driven through the full middleware stack with
//! `tower::ServiceExt::oneshot`; no socket is bound.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::Value;
use tower::ServiceExt;

use crowdvine_core::{
    InMemoryContentStore, InMemorySettingsStore,
    cookies::{ACCESS_GRANTED_COOKIE, CART_ID_COOKIE},
};
use crowdvine_server::{AppState, ServerConfig, router};

fn app_with(config: ServerConfig, threshold: u32) -> Router {
    let content = InMemoryContentStore::new()
        .with_asset("header_logo_dirtywine", "https://cdn.example.com/dw-header.svg")
        .with_asset("header_logo_pact", "https://cdn.example.com/pact-header.svg");
    let state = AppState::new(
        &config,
        Arc::new(InMemorySettingsStore::with_few_left_threshold(threshold)),
        Arc::new(content),
    )
    .unwrap();
    router(state)
}

fn app() -> Router {
    app_with(ServerConfig::default(), 5)
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, host: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, host)
        .body(Body::empty())
        .unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_dirtywine_host_serves_b2b_storefront() {
    let response = send(app(), get("/api/storefront", "www.dirtywine.se")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-crowdvine-tenant").unwrap(), "b2b");

    let body = json_body(response).await;
    assert_eq!(body["tenant"], "b2b");
    assert_eq!(body["brand"], "Dirtywine");
    assert_eq!(body["logos"]["header_logo"], "header_logo_dirtywine");
    assert_eq!(body["logos"]["footer_logo"], "footer_logo_dirtywine");
    assert_eq!(body["logos"]["alternative_logo"], "alternative_logo_dirtywine");
    assert_eq!(body["features"]["require_access_grant"], true);
    assert_eq!(body["access_granted"], false);
    assert_eq!(body["catalogue_visible"], false);
}

#[tokio::test]
async fn test_other_hosts_serve_b2c_storefront() {
    let response = send(app(), get("/api/storefront", "pactwines.com")).await;

    assert_eq!(response.headers().get("x-crowdvine-tenant").unwrap(), "b2c");
    let body = json_body(response).await;
    assert_eq!(body["tenant"], "b2c");
    assert_eq!(body["brand"], "Pact Wines");
    assert_eq!(body["logos"]["header_logo"], "header_logo_pact");
    assert_eq!(body["catalogue_visible"], true);
}

#[tokio::test]
async fn test_localhost_without_override_is_b2c() {
    let response = send(app(), get("/api/storefront", "localhost:3000")).await;
    assert_eq!(response.headers().get("x-crowdvine-tenant").unwrap(), "b2c");
}

#[tokio::test]
async fn test_localhost_with_override_is_b2b() {
    let mut config = ServerConfig::default();
    config.tenancy.local_override = true;

    let response = send(app_with(config, 5), get("/api/storefront", "localhost:3000")).await;
    assert_eq!(response.headers().get("x-crowdvine-tenant").unwrap(), "b2b");
}

#[tokio::test]
async fn test_access_cookie_makes_b2b_catalogue_visible() {
    let request = Request::builder()
        .uri("/api/storefront")
        .header(header::HOST, "dirtywine.se")
        .header(header::COOKIE, format!("{}=true", ACCESS_GRANTED_COOKIE))
        .body(Body::empty())
        .unwrap();

    let body = json_body(send(app(), request).await).await;
    assert_eq!(body["access_granted"], true);
    assert_eq!(body["catalogue_visible"], true);
}

#[tokio::test]
async fn test_non_sentinel_access_cookie_keeps_catalogue_hidden() {
    let request = Request::builder()
        .uri("/api/storefront")
        .header(header::HOST, "dirtywine.se")
        .header(header::COOKIE, format!("{}=false", ACCESS_GRANTED_COOKIE))
        .body(Body::empty())
        .unwrap();

    let body = json_body(send(app(), request).await).await;
    assert_eq!(body["access_granted"], false);
    assert_eq!(body["catalogue_visible"], false);
}

#[tokio::test]
async fn test_content_lookup_uses_tenant_key() {
    let response = send(app(), get("/api/content/header_logo", "shop.dirtywine.se")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["key"], "header_logo_dirtywine");
    assert_eq!(body["url"], "https://cdn.example.com/dw-header.svg");
}

#[tokio::test]
async fn test_content_lookup_miss_is_not_found() {
    let response = send(app(), get("/api/content/footer_logo", "pactwines.com")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "not_found");
    assert!(body["message"].as_str().unwrap().contains("footer_logo_pact"));
}

#[tokio::test]
async fn test_unknown_content_slot_is_bad_request() {
    let response = send(app(), get("/api/content/banner", "pactwines.com")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stock_policy_reports_threshold() {
    let response = send(app_with(ServerConfig::default(), 3), get("/api/stock/policy", "pactwines.com")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["few_left_threshold"], 3);
}

#[tokio::test]
async fn test_stock_badge_classification() {
    let cases = [(0, "sold_out"), (3, "few_left"), (5, "few_left"), (6, "in_stock")];

    for (available, expected) in cases {
        let uri = format!("/api/stock/badge?available={}", available);
        let body = json_body(send(app(), get(&uri, "pactwines.com")).await).await;
        assert_eq!(body["badge"], expected, "available = {}", available);
        assert_eq!(body["few_left_threshold"], 5);
        assert_eq!(body["visible"], true);
    }
}

#[tokio::test]
async fn test_stock_badge_requires_available() {
    let response = send(app(), get("/api/stock/badge", "pactwines.com")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_stock_badge_rejects_non_numeric_available() {
    let response = send(app(), get("/api/stock/badge?available=abc", "pactwines.com")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_request");
    assert!(body["message"].as_str().unwrap().contains("available"));
}

#[tokio::test]
async fn test_cart_issues_cookie_when_missing() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/cart")
        .header(header::HOST, "pactwines.com")
        .body(Body::empty())
        .unwrap();

    let response = send(app(), request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with(&format!("{}=", CART_ID_COOKIE)));
    assert!(cookies[0].contains("Max-Age=7776000"));
    assert!(cookies[0].contains("Path=/"));

    let body = json_body(response).await;
    assert_eq!(body["created"], true);
    let cart_id = body["cart_id"].as_str().unwrap();
    assert!(!cart_id.is_empty());
    assert!(cookies[0].contains(cart_id));
}

#[tokio::test]
async fn test_cart_reuses_existing_cookie() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/cart")
        .header(header::HOST, "pactwines.com")
        .header(header::COOKIE, format!("theme=dark; {}=cart-42", CART_ID_COOKIE))
        .body(Body::empty())
        .unwrap();

    let response = send(app(), request).await;
    assert!(set_cookies(&response).is_empty());

    let body = json_body(response).await;
    assert_eq!(body["cart_id"], "cart-42");
    assert_eq!(body["created"], false);
}

#[tokio::test]
async fn test_access_grant_cookie() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/access")
        .header(header::HOST, "dirtywine.se")
        .body(Body::empty())
        .unwrap();

    let response = send(app(), request).await;
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with(&format!("{}=true", ACCESS_GRANTED_COOKIE)));
    assert!(cookies[0].contains("Max-Age=31536000"));

    let body = json_body(response).await;
    assert_eq!(body["granted"], true);
    assert_eq!(body["created"], true);
}

#[tokio::test]
async fn test_secure_cookies_when_configured() {
    let mut config = ServerConfig::default();
    config.cookies.secure = true;

    let request = Request::builder()
        .method("POST")
        .uri("/api/cart")
        .header(header::HOST, "pactwines.com")
        .body(Body::empty())
        .unwrap();

    let response = send(app_with(config, 5), request).await;
    assert!(set_cookies(&response)[0].ends_with("; Secure"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/api/stock/policy")
        .header(header::HOST, "pactwines.com")
        .header("x-request-id", "client-abc")
        .body(Body::empty())
        .unwrap();

    let response = send(app(), request).await;
    assert_eq!(response.headers().get("x-request-id").unwrap(), "client-abc");
    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
}

#[tokio::test]
async fn test_health_endpoints() {
    let response = send(app(), get("/healthz", "pactwines.com")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(app(), get("/readyz", "pactwines.com")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["stores"][0]["name"], "settings:memory");
}

#[tokio::test]
async fn test_metrics_endpoint_counts_tenants() {
    let config = ServerConfig::default();
    let state = AppState::new(
        &config,
        Arc::new(InMemorySettingsStore::new()),
        Arc::new(InMemoryContentStore::new()),
    )
    .unwrap();
    let app = router(state);

    send(app.clone(), get("/api/storefront", "dirtywine.se")).await;
    let response = send(app, get("/metrics", "dirtywine.se")).await;

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("crowdvine_tenant_resolutions_total{tenant=\"b2b\"} 1"));
}
