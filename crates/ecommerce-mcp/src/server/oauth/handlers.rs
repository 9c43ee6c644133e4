//! OAuth 2.0 endpoint handlers.
//!
//! Implements:
//! - RFC 9728: OAuth Protected Resource Metadata
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256)
//! - RFC 6749: Authorization Code and Client Credentials grants

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::config::oauth;
use crate::error::AuthError;
use crate::server::transport::HttpState;

use super::pkce;
use super::store::IssuedToken;

// ─── RFC 9728: Protected Resource Metadata ───────────────────────────────────

/// `GET /.well-known/oauth-protected-resource`
///
/// Tells clients which authorization server protects this resource.
pub async fn handle_protected_resource(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "resource": state.auth.resource_id(),
        "authorization_servers": [state.config.base_url],
        "scopes_supported": [oauth::DEFAULT_SCOPE],
        "resource_documentation": format!("{}/docs", state.config.base_url)
    }))
}

// ─── RFC 8414: Authorization Server Metadata ─────────────────────────────────

fn auth_server_metadata_body(base_url: &str) -> serde_json::Value {
    serde_json::json!({
        "issuer": base_url,
        "authorization_endpoint": format!("{base_url}/oauth/authorize"),
        "token_endpoint": format!("{base_url}/oauth/token"),
        "registration_endpoint": format!("{base_url}/register"),
        "jwks_uri": format!("{base_url}/oauth/jwks.json"),
        "code_challenge_methods_supported": ["S256"],
        "scopes_supported": [oauth::DEFAULT_SCOPE],
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "client_credentials"],
        "token_endpoint_auth_methods_supported": [oauth::AUTH_METHOD]
    })
}

/// `GET /.well-known/oauth-authorization-server`
pub async fn handle_auth_server_metadata(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(auth_server_metadata_body(&state.config.base_url))
}

/// `GET /.well-known/openid-configuration`
///
/// Alias of the authorization server metadata for clients that only
/// probe the OIDC path.
pub async fn handle_openid_configuration(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(auth_server_metadata_body(&state.config.base_url))
}

/// `GET /oauth/jwks.json`
///
/// Tokens are opaque, so the key set is empty.
pub async fn handle_jwks() -> impl IntoResponse {
    Json(serde_json::json!({ "keys": [] }))
}

// ─── RFC 7591: Dynamic Client Registration ───────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub redirect_uris: Option<Vec<String>>,
}

/// `POST /register`
///
/// Register a new OAuth client dynamically. Mints a fresh id/secret pair.
pub async fn handle_register(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let client = match state.auth.register_client(req.redirect_uris.unwrap_or_default()).await {
        Ok(client) => client,
        Err(err) => return registration_error(&err),
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "client_id": client.client_id,
            "client_secret": client.client_secret,
            "redirect_uris": client.redirect_uris,
            "token_endpoint_auth_method": oauth::AUTH_METHOD,
            "grant_types": ["authorization_code", "client_credentials"],
            "response_types": ["code"],
            "scope": oauth::DEFAULT_SCOPE
        })),
    )
        .into_response()
}

// ─── Authorization Endpoint ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub scope: Option<String>,
    pub resource: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

/// `GET /oauth/authorize`
///
/// Auto-approves the request: this is a demo server with no user accounts,
/// so any registered client with a registered redirect URI gets a code
/// immediately. PKCE parameters are recorded as given and enforced at the
/// token endpoint.
pub async fn handle_authorize(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    let client = match query.client_id.as_deref() {
        Some(client_id) => state.auth.client(client_id).await,
        None => None,
    };
    let Some(client) = client else {
        return (StatusCode::BAD_REQUEST, "invalid client_id").into_response();
    };

    let redirect_uri = query.redirect_uri.as_deref().unwrap_or_default();
    if !client.has_redirect_uri(redirect_uri) {
        return (StatusCode::BAD_REQUEST, "invalid redirect_uri").into_response();
    }
    let Ok(mut location) = url::Url::parse(redirect_uri) else {
        return (StatusCode::BAD_REQUEST, "invalid redirect_uri").into_response();
    };

    let code = state
        .auth
        .issue_code(
            client.client_id.clone(),
            redirect_uri.to_string(),
            query.resource,
            query.scope,
            query.code_challenge,
            query.code_challenge_method,
        )
        .await;

    tracing::info!(client_id = %client.client_id, "Auto-approved authorization request");

    {
        let mut pairs = location.query_pairs_mut();
        pairs.append_pair("code", &code);
        if let Some(ref auth_state) = query.state {
            pairs.append_pair("state", auth_state);
        }
    }

    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

// ─── Token Endpoint ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub code: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
}

/// `POST /oauth/token`
///
/// Form-encoded token endpoint supporting the authorization_code and
/// client_credentials grants, with `client_secret_post` authentication.
pub async fn handle_token(
    State(state): State<Arc<HttpState>>,
    axum::Form(form): axum::Form<TokenRequest>,
) -> Response {
    match form.grant_type.as_str() {
        "authorization_code" => match authorization_code_grant(&state, &form).await {
            Ok(issued) => token_success(&issued),
            Err(err) => token_error(&err),
        },
        "client_credentials" => match client_credentials_grant(&state, &form).await {
            Ok(issued) => token_success(&issued),
            Err(err) => token_error(&err),
        },
        other => token_error(&AuthError::unsupported_grant_type(other)),
    }
}

async fn authenticate(state: &HttpState, form: &TokenRequest) -> Result<String, AuthError> {
    let client_id = form.client_id.as_deref().ok_or(AuthError::InvalidClient)?;
    let client_secret = form.client_secret.as_deref().ok_or(AuthError::InvalidClient)?;
    let client = state.auth.authenticate_client(client_id, client_secret).await?;
    Ok(client.client_id)
}

async fn authorization_code_grant(
    state: &HttpState,
    form: &TokenRequest,
) -> Result<IssuedToken, AuthError> {
    let client_id = authenticate(state, form).await?;

    let code = form.code.as_deref().ok_or_else(|| AuthError::invalid_grant("missing code"))?;

    // Pop first: whatever happens below, the code is spent.
    let auth_code = state
        .auth
        .take_code(code)
        .await
        .ok_or_else(|| AuthError::invalid_grant("unknown or already used code"))?;

    if auth_code.client_id != client_id {
        return Err(AuthError::invalid_grant("code was issued to a different client"));
    }
    if form.redirect_uri.as_deref() != Some(auth_code.redirect_uri.as_str()) {
        return Err(AuthError::invalid_grant("redirect_uri mismatch"));
    }
    if auth_code.is_expired() {
        return Err(AuthError::ExpiredCode);
    }

    if let Some(ref challenge) = auth_code.code_challenge {
        let verifier = form
            .code_verifier
            .as_deref()
            .ok_or_else(|| AuthError::invalid_grant("code_verifier required"))?;
        if auth_code.code_challenge_method.as_deref() != Some("S256") {
            return Err(AuthError::invalid_grant("unsupported code_challenge_method"));
        }
        if !pkce::verify_s256(verifier, challenge) {
            return Err(AuthError::invalid_grant("PKCE verification failed"));
        }
    }

    tracing::info!(client_id = %client_id, "Issued access token (authorization_code)");

    Ok(state.auth.issue_token(client_id, auth_code.resource, auth_code.scope).await)
}

async fn client_credentials_grant(
    state: &HttpState,
    form: &TokenRequest,
) -> Result<IssuedToken, AuthError> {
    let client_id = authenticate(state, form).await?;

    tracing::info!(client_id = %client_id, "Issued access token (client_credentials)");

    let resource = state.auth.resource_id().to_string();
    Ok(state.auth.issue_token(client_id, resource, oauth::DEFAULT_SCOPE.to_string()).await)
}

/// Token response with the cache headers RFC 6749 §5.1 requires.
fn token_success(issued: &IssuedToken) -> Response {
    let mut response = Json(serde_json::json!({
        "access_token": issued.access_token,
        "token_type": "bearer",
        "expires_in": issued.expires_in,
        "scope": issued.scope
    }))
    .into_response();

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

fn token_error(err: &AuthError) -> Response {
    (err.status(), Json(serde_json::json!({ "error": err.error_code() }))).into_response()
}

fn registration_error(err: &AuthError) -> Response {
    (
        err.status(),
        Json(serde_json::json!({
            "error": err.error_code(),
            "error_description": err.to_string()
        })),
    )
        .into_response()
}
