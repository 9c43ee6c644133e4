//! Expiry behavior of authorization codes and access tokens.
//!
//! Uses tokio's paused clock to test lifetime boundaries exactly.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use ecommerce_mcp::cart::CartStore;
use ecommerce_mcp::config::Config;
use ecommerce_mcp::server::transport::create_router;
use ecommerce_mcp::tools::{self, ToolContext};

const REDIRECT_URI: &str = "http://localhost:3000/callback";

fn build_test_router() -> axum::Router {
    let config = Config::for_testing("https://shop.test");
    let ctx = ToolContext::new(CartStore::default());
    let tools = tools::register_all_tools();

    create_router(tools, ctx, config)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn register_client(app: &axum::Router) -> (String, String) {
    let response = app
        .clone()
        .oneshot(
            Request::post("/register")
                .header("Content-Type", "application/json")
                .body(Body::from(json!({ "redirect_uris": [REDIRECT_URI] }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    (
        json["client_id"].as_str().unwrap().to_string(),
        json["client_secret"].as_str().unwrap().to_string(),
    )
}

async fn authorize(app: &axum::Router, client_id: &str) -> String {
    let query = serde_urlencoded::to_string([
        ("client_id", client_id),
        ("redirect_uri", REDIRECT_URI),
    ])
    .unwrap();

    let response = app
        .clone()
        .oneshot(Request::get(format!("/oauth/authorize?{query}")).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers().get("Location").unwrap().to_str().unwrap();
    let location = url::Url::parse(location).unwrap();
    location.query_pairs().find(|(k, _)| k == "code").map(|(_, v)| v.to_string()).unwrap()
}

async fn exchange_code(
    app: &axum::Router,
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> axum::response::Response {
    let body = serde_urlencoded::to_string([
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("redirect_uri", REDIRECT_URI),
    ])
    .unwrap();

    app.clone()
        .oneshot(
            Request::post("/oauth/token")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn client_credentials_token(app: &axum::Router) -> String {
    let (client_id, client_secret) = register_client(app).await;
    let body = serde_urlencoded::to_string([
        ("grant_type", "client_credentials"),
        ("client_id", client_id.as_str()),
        ("client_secret", client_secret.as_str()),
    ])
    .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::post("/oauth/token")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    body_json(response).await["access_token"].as_str().unwrap().to_string()
}

async fn call_protected(app: &axum::Router, token: &str) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::get("/api/products")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

#[tokio::test(start_paused = true)]
async fn test_code_valid_just_before_ttl() {
    let app = build_test_router();
    let (client_id, client_secret) = register_client(&app).await;
    let code = authorize(&app, &client_id).await;

    tokio::time::advance(Duration::from_secs(299)).await;

    let response = exchange_code(&app, &client_id, &client_secret, &code).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_code_expired_past_ttl() {
    let app = build_test_router();
    let (client_id, client_secret) = register_client(&app).await;
    let code = authorize(&app, &client_id).await;

    tokio::time::advance(Duration::from_secs(301)).await;

    let response = exchange_code(&app, &client_id, &client_secret, &code).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "expired_code");
}

#[tokio::test(start_paused = true)]
async fn test_token_valid_just_before_ttl() {
    let app = build_test_router();
    let token = client_credentials_token(&app).await;

    tokio::time::advance(Duration::from_secs(3599)).await;

    assert_eq!(call_protected(&app, &token).await, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_token_expired_past_ttl() {
    let app = build_test_router();
    let token = client_credentials_token(&app).await;

    tokio::time::advance(Duration::from_secs(3601)).await;

    assert_eq!(call_protected(&app, &token).await, StatusCode::UNAUTHORIZED);
}
