//! In-memory state for the embedded authorization server.
//!
//! Three independent stores (clients, codes, tokens) behind `RwLock`s,
//! passed into handlers by cloning. Expiry is lazy: entries are checked
//! and dropped at the point of use, never by a background task.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::oauth;
use crate::error::AuthError;

use super::types::{AccessToken, AuthorizationCode, Client, TokenInfo};

/// A freshly minted access token, shaped for the token response.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: u64,
    pub scope: String,
}

/// Shared authorization-server state.
#[derive(Clone)]
pub struct AuthServerState {
    resource_id: String,
    clients: Arc<RwLock<HashMap<String, Client>>>,
    codes: Arc<RwLock<HashMap<String, AuthorizationCode>>>,
    tokens: Arc<RwLock<HashMap<String, AccessToken>>>,
}

impl AuthServerState {
    /// Create empty state bound to the canonical resource identifier.
    #[must_use]
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            clients: Arc::new(RwLock::new(HashMap::new())),
            codes: Arc::new(RwLock::new(HashMap::new())),
            tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The canonical resource identifier tokens are bound to.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Generate an opaque URL-safe credential from two UUIDs (32 bytes).
    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
        bytes[16..].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Register a new client (Dynamic Client Registration).
    ///
    /// Mints a fresh id and secret. Rejects registration without at least
    /// one redirect URI.
    pub async fn register_client(&self, redirect_uris: Vec<String>) -> Result<Client, AuthError> {
        if redirect_uris.is_empty() {
            return Err(AuthError::invalid_client_metadata("redirect_uris is required"));
        }

        let client = Client {
            client_id: uuid::Uuid::new_v4().simple().to_string(),
            client_secret: uuid::Uuid::new_v4().simple().to_string(),
            redirect_uris,
        };

        self.clients.write().await.insert(client.client_id.clone(), client.clone());

        tracing::info!(client_id = %client.client_id, "Registered OAuth client");
        Ok(client)
    }

    /// Look up a client by id.
    pub async fn client(&self, client_id: &str) -> Option<Client> {
        self.clients.read().await.get(client_id).cloned()
    }

    /// Authenticate a client by id and secret.
    pub async fn authenticate_client(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Client, AuthError> {
        let clients = self.clients.read().await;
        match clients.get(client_id) {
            Some(client) if client.client_secret == client_secret => Ok(client.clone()),
            _ => Err(AuthError::InvalidClient),
        }
    }

    /// Issue an authorization code bound to the given request parameters.
    ///
    /// `resource` falls back to the canonical resource id, `scope` to the
    /// default scope.
    pub async fn issue_code(
        &self,
        client_id: String,
        redirect_uri: String,
        resource: Option<String>,
        scope: Option<String>,
        code_challenge: Option<String>,
        code_challenge_method: Option<String>,
    ) -> String {
        let code = Self::generate_token();
        let created_at = Instant::now();

        self.codes.write().await.insert(
            code.clone(),
            AuthorizationCode {
                client_id,
                redirect_uri,
                resource: resource.unwrap_or_else(|| self.resource_id.clone()),
                scope: scope.unwrap_or_else(|| oauth::DEFAULT_SCOPE.to_string()),
                code_challenge,
                code_challenge_method,
                created_at,
                expires_at: created_at + oauth::CODE_TTL,
            },
        );

        code
    }

    /// Remove and return an authorization code in one lock acquisition.
    ///
    /// Single use is enforced here: once popped, the code is gone no
    /// matter what the caller decides about it afterwards.
    pub async fn take_code(&self, code: &str) -> Option<AuthorizationCode> {
        self.codes.write().await.remove(code)
    }

    /// Mint an access token for a client.
    pub async fn issue_token(
        &self,
        client_id: String,
        resource: String,
        scope: String,
    ) -> IssuedToken {
        let token = Self::generate_token();
        let created_at = Instant::now();

        self.tokens.write().await.insert(
            token.clone(),
            AccessToken {
                client_id,
                resource,
                scope: scope.clone(),
                created_at,
                expires_at: created_at + oauth::TOKEN_TTL,
            },
        );

        IssuedToken { access_token: token, expires_in: oauth::TOKEN_TTL.as_secs(), scope }
    }

    /// Verify a bearer token.
    ///
    /// Unknown tokens return `None`. Expired tokens are deleted under the
    /// write lock, then also return `None`.
    pub async fn verify_token(&self, token: &str) -> Option<TokenInfo> {
        let mut tokens = self.tokens.write().await;
        let access = tokens.get(token)?;

        if access.is_expired() {
            tokens.remove(token);
            return None;
        }

        Some(TokenInfo {
            client_id: access.client_id.clone(),
            scope: access.scope.clone(),
            resource: access.resource.clone(),
        })
    }
}

impl std::fmt::Debug for AuthServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServerState").field("resource_id", &self.resource_id).finish()
    }
}
