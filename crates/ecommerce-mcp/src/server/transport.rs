//! Transport layer implementations.
//!
//! Provides stdio and HTTP transports for the MCP server. The HTTP
//! transport speaks streamable HTTP (POST + SSE on `/mcp`) as well as
//! the legacy SSE endpoint pair, and additionally serves the REST
//! storefront API and the embedded OAuth endpoints. Everything under
//! `/mcp` and `/api` requires a bearer token.

use std::borrow::Cow;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::oauth::{AuthServerState, handlers as oauth_handlers, verifier};
use super::session::SessionManager;
use crate::config::Config;
use crate::tools::{McpTool, ToolContext};

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    /// JSON-RPC version constant.
    const VERSION: &'static str = "2.0";

    #[must_use]
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(Self::VERSION),
            result: Some(result),
            error: None,
            id,
        }
    }

    #[must_use]
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(Self::VERSION),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
            id,
        }
    }
}

/// MCP tool info for tools/list response.
#[derive(Debug, Serialize)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Query parameters for the legacy message endpoint.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    session_id: Option<String>,
}

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub config: Config,
    pub auth: AuthServerState,
    pub ctx: ToolContext,
    pub tools: Vec<Box<dyn McpTool>>,
    pub sessions: SessionManager,
}

impl std::fmt::Debug for HttpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpState")
            .field("config", &self.config)
            .field("tool_count", &self.tools.len())
            .finish()
    }
}

/// Create the HTTP router with all MCP, REST, and OAuth routes.
pub fn create_router(tools: Vec<Box<dyn McpTool>>, ctx: ToolContext, config: Config) -> Router {
    let sessions = SessionManager::new();
    sessions.start_cleanup_task();

    let auth = AuthServerState::new(config.resource_id.clone());

    let state = Arc::new(HttpState { config, auth, ctx, tools, sessions });

    let protected = Router::new()
        .route("/mcp", post(handle_mcp_post).get(handle_mcp_get))
        .route("/mcp/sse", get(handle_sse_legacy))
        .route("/mcp/messages", post(handle_message_post))
        .route("/api/products", get(api_products))
        .route("/api/cart", get(api_cart))
        .route("/api/cart/add", post(api_cart_add))
        .route("/api/cart/remove", post(api_cart_remove))
        .route("/api/checkout", post(api_checkout))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            verifier::require_bearer,
        ));

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route(
            "/.well-known/oauth-protected-resource",
            get(oauth_handlers::handle_protected_resource),
        )
        .route(
            "/.well-known/oauth-authorization-server",
            get(oauth_handlers::handle_auth_server_metadata),
        )
        .route(
            "/.well-known/openid-configuration",
            get(oauth_handlers::handle_openid_configuration),
        )
        .route("/oauth/jwks.json", get(oauth_handlers::handle_jwks))
        .route("/register", post(oauth_handlers::handle_register))
        .route("/oauth/authorize", get(oauth_handlers::handle_authorize))
        .route("/oauth/token", post(oauth_handlers::handle_token))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ecommerce-mcp",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ─── MCP Dispatch ────────────────────────────────────────────────────────────

/// Handle a single JSON-RPC request, shared by the HTTP and stdio
/// transports. Returns `None` for notifications, which get no response.
pub async fn dispatch(
    request: &JsonRpcRequest,
    tools: &[Box<dyn McpTool>],
    ctx: &ToolContext,
) -> Option<JsonRpcResponse> {
    if request.method.starts_with("notifications/") {
        return None;
    }

    let id = request.id.clone();
    let response = match request.method.as_str() {
        "initialize" => handle_initialize(id),
        "tools/list" => handle_tools_list(id, tools),
        "tools/call" => handle_tools_call(id, &request.params, tools, ctx).await,
        "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
        other => {
            JsonRpcResponse::error(id, -32601, format!("Method not found: {other}"))
        }
    };

    Some(response)
}

fn handle_initialize(id: Option<serde_json::Value>) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "ecommerce-mcp",
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
    )
}

fn handle_tools_list(
    id: Option<serde_json::Value>,
    tools: &[Box<dyn McpTool>],
) -> JsonRpcResponse {
    let infos: Vec<McpToolInfo> = tools
        .iter()
        .map(|tool| McpToolInfo {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema(),
        })
        .collect();

    JsonRpcResponse::success(id, serde_json::json!({ "tools": infos }))
}

async fn handle_tools_call(
    id: Option<serde_json::Value>,
    params: &serde_json::Value,
    tools: &[Box<dyn McpTool>],
    ctx: &ToolContext,
) -> JsonRpcResponse {
    let Some(name) = params.get("name").and_then(serde_json::Value::as_str) else {
        return JsonRpcResponse::error(id, -32602, "Missing tool name");
    };

    let Some(tool) = tools.iter().find(|tool| tool.name() == name) else {
        return JsonRpcResponse::error(id, -32602, format!("Unknown tool: {name}"));
    };

    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));

    match tool.execute(ctx, arguments).await {
        Ok(text) => JsonRpcResponse::success(
            id,
            serde_json::json!({
                "content": [{ "type": "text", "text": text }],
                "isError": false
            }),
        ),
        Err(err) => {
            tracing::warn!(tool = name, error = %err, "Tool execution failed");
            JsonRpcResponse::success(
                id,
                serde_json::json!({
                    "content": [{ "type": "text", "text": err.to_user_message() }],
                    "isError": true
                }),
            )
        }
    }
}

// ─── Streamable HTTP Transport ───────────────────────────────────────────────

/// `POST /mcp`
///
/// Handles JSON-RPC requests. Responses are returned inline; tool-call
/// responses are additionally fanned out to SSE subscribers of the same
/// session.
async fn handle_mcp_post(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    let session_id = headers
        .get("mcp-session-id")
        .and_then(|value| value.to_str().ok());
    let session = state.sessions.get_or_create_session(session_id).await;

    tracing::debug!(
        session_id = %session.id,
        method = %request.method,
        "Received MCP request"
    );

    let Some(response) = dispatch(&request, &state.tools, &state.ctx).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    if request.method == "tools/call" {
        if let Ok(serialized) = serde_json::to_string(&response) {
            session.send(serialized).await;
        }
    }

    let mut http_response = Json(&response).into_response();
    if request.method == "initialize" {
        if let Ok(value) = session.id.parse() {
            http_response.headers_mut().insert("Mcp-Session-Id", value);
        }
    }
    http_response
}

/// `GET /mcp`
///
/// SSE stream of server messages for the session named by the
/// `Mcp-Session-Id` header.
async fn handle_mcp_get(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> Response {
    let session_id = headers
        .get("mcp-session-id")
        .and_then(|value| value.to_str().ok());
    let session = state.sessions.get_or_create_session(session_id).await;

    tracing::debug!(session_id = %session.id, "SSE stream opened");

    sse_response(live_stream(session.subscribe()))
}

// ─── Legacy SSE Transport ────────────────────────────────────────────────────

/// `GET /mcp/sse`
///
/// Legacy SSE transport. Opens a fresh session and announces the
/// message-post URL in an initial `endpoint` event.
async fn handle_sse_legacy(State(state): State<Arc<HttpState>>) -> Response {
    let session = state.sessions.create_session().await;

    tracing::debug!(session_id = %session.id, "Legacy SSE stream opened");

    let endpoint = format!(
        "{}/mcp/messages?session_id={}",
        state.config.base_url, session.id
    );
    let endpoint_event = stream::once(async move {
        Ok::<Event, Infallible>(Event::default().event("endpoint").data(endpoint))
    });

    sse_response(endpoint_event.chain(live_stream(session.subscribe())))
}

/// `POST /mcp/messages?session_id=...`
///
/// Legacy message endpoint paired with `GET /mcp/sse`. Responses go out
/// on the session's SSE stream; the POST itself returns 202.
async fn handle_message_post(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<MessageQuery>,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    let session = match query.session_id.as_deref() {
        Some(id) => state.sessions.get_session(id).await,
        None => None,
    };
    let Some(session) = session else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "unknown session" })),
        )
            .into_response();
    };
    session.touch().await;

    let Some(response) = dispatch(&request, &state.tools, &state.ctx).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    if let Ok(serialized) = serde_json::to_string(&response) {
        session.send(serialized).await;
    }

    StatusCode::ACCEPTED.into_response()
}

fn live_stream(
    rx: tokio::sync::broadcast::Receiver<String>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|message| async move {
        message
            .ok()
            .map(|msg| Ok(Event::default().event("message").data(msg)))
    })
}

fn sse_response(
    stream: impl Stream<Item = Result<Event, Infallible>> + Send + 'static,
) -> Response {
    let mut response = Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("ping"),
        )
        .into_response();

    let headers = response.headers_mut();
    headers.insert("X-Accel-Buffering", axum::http::HeaderValue::from_static("no"));
    headers.insert(
        axum::http::header::CACHE_CONTROL,
        axum::http::HeaderValue::from_static("no-cache"),
    );
    response
}

// ─── REST Storefront API ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProductIdRequest {
    #[serde(rename = "productId")]
    product_id: String,
}

#[derive(Debug, Deserialize)]
struct ProductsQuery {
    #[serde(default)]
    query: String,
}

/// `GET /api/products?query=...`
async fn api_products(Query(query): Query<ProductsQuery>) -> impl IntoResponse {
    Json(crate::tools::search_products_response(&query.query))
}

/// `GET /api/cart`
async fn api_cart(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(crate::tools::get_cart_response(&state.ctx.cart).await)
}

/// `POST /api/cart/add`
async fn api_cart_add(
    State(state): State<Arc<HttpState>>,
    Json(request): Json<ProductIdRequest>,
) -> impl IntoResponse {
    Json(crate::tools::add_to_cart_response(&state.ctx.cart, &request.product_id).await)
}

/// `POST /api/cart/remove`
async fn api_cart_remove(
    State(state): State<Arc<HttpState>>,
    Json(request): Json<ProductIdRequest>,
) -> impl IntoResponse {
    Json(crate::tools::remove_from_cart_response(&state.ctx.cart, &request.product_id).await)
}

/// `POST /api/checkout`
async fn api_checkout(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(crate::tools::checkout_response(&state.ctx.cart).await)
}
