//! REST storefront API tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use ecommerce_mcp::cart::CartStore;
use ecommerce_mcp::config::Config;
use ecommerce_mcp::server::transport::create_router;
use ecommerce_mcp::tools::{self, ToolContext};

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

async fn bearer_token(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::post("/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({ "redirect_uris": ["http://localhost:3000/callback"] }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let registered = body_json(response).await;

    let body = serde_urlencoded::to_string([
        ("grant_type", "client_credentials"),
        ("client_id", registered["client_id"].as_str().unwrap()),
        ("client_secret", registered["client_secret"].as_str().unwrap()),
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

async fn get(app: &axum::Router, token: &str, path: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::get(path)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn post(
    app: &axum::Router,
    token: &str,
    path: &str,
    body: serde_json::Value,
) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::post(path)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = build_test_router();

    let response = app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "ecommerce-mcp");
}

#[tokio::test]
async fn test_products_requires_bearer() {
    let app = build_test_router();

    let response =
        app.oneshot(Request::get("/api/products").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_products_search() {
    let app = build_test_router();
    let token = bearer_token(&app).await;

    let response = get(&app, &token, "/api/products?query=laptop").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["products"][0]["id"], "p1");
    assert_eq!(json["message"], "1 ürün bulundu");
}

#[tokio::test]
async fn test_products_without_query_lists_all() {
    let app = build_test_router();
    let token = bearer_token(&app).await;

    let response = get(&app, &token, "/api/products").await;
    let json = body_json(response).await;
    assert_eq!(json["count"], 4);
}

#[tokio::test]
async fn test_cart_add_remove_flow() {
    let app = build_test_router();
    let token = bearer_token(&app).await;

    let response = post(&app, &token, "/api/cart/add", json!({ "productId": "p1" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Laptop sepete eklendi");

    post(&app, &token, "/api/cart/add", json!({ "productId": "p1" })).await;
    post(&app, &token, "/api/cart/add", json!({ "productId": "p3" })).await;

    let response = post(&app, &token, "/api/cart/remove", json!({ "productId": "p1" })).await;
    let json = body_json(response).await;
    assert_eq!(json["success"], true);

    let response = get(&app, &token, "/api/cart").await;
    let json = body_json(response).await;
    assert_eq!(json["isEmpty"], false);
    assert_eq!(json["cart"]["totalQuantity"], 2);
    assert_eq!(json["cart"]["totalAmountFormatted"], "25.600.00 ₺");
}

#[tokio::test]
async fn test_cart_add_unknown_product() {
    let app = build_test_router();
    let token = bearer_token(&app).await;

    let response = post(&app, &token, "/api/cart/add", json!({ "productId": "p42" })).await;
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Ürün bulunamadı");
}

#[tokio::test]
async fn test_checkout_flow() {
    let app = build_test_router();
    let token = bearer_token(&app).await;

    post(&app, &token, "/api/cart/add", json!({ "productId": "p4" })).await;

    let response = post(&app, &token, "/api/checkout", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["success"], true);
    assert!(json["order"]["orderId"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(json["order"]["total"], "900.00 ₺");
    assert_eq!(json["order"]["itemCount"], 1);

    // The cart is drained by checkout.
    let response = get(&app, &token, "/api/cart").await;
    let json = body_json(response).await;
    assert_eq!(json["isEmpty"], true);
}

#[tokio::test]
async fn test_checkout_empty_cart_fails() {
    let app = build_test_router();
    let token = bearer_token(&app).await;

    let response = post(&app, &token, "/api/checkout", json!({})).await;
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Sepet boş, sipariş verilemez");
}
