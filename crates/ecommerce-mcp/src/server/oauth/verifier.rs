//! Bearer-token verification middleware for protected resource routes.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use crate::server::transport::HttpState;

/// Middleware guarding every protected route.
///
/// Missing, unknown, or expired tokens get a 401 whose `WWW-Authenticate`
/// challenge points at the protected-resource metadata, so MCP clients can
/// discover the authorization server and start the flow. On success the
/// verified `TokenInfo` is attached to the request extensions.
pub async fn require_bearer(
    State(state): State<Arc<HttpState>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let info = match bearer {
        Some(TypedHeader(auth)) => state.auth.verify_token(auth.token()).await,
        None => None,
    };

    let Some(info) = info else {
        tracing::debug!(path = %request.uri().path(), "Rejected request without valid bearer token");
        return unauthorized(&state.config.resource_metadata_url());
    };

    request.extensions_mut().insert(info);
    next.run(request).await
}

fn unauthorized(resource_metadata_url: &str) -> Response {
    let challenge = format!("Bearer resource_metadata=\"{resource_metadata_url}\"");
    let challenge = HeaderValue::from_str(&challenge)
        .unwrap_or_else(|_| HeaderValue::from_static("Bearer"));

    let mut response = (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "invalid_token" })),
    )
        .into_response();
    response.headers_mut().insert(header::WWW_AUTHENTICATE, challenge);
    response
}
