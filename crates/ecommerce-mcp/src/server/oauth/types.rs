//! OAuth 2.0 types for the embedded authorization server.

use tokio::time::Instant;

/// A dynamically registered OAuth client.
///
/// Immutable after registration; clients are never deleted.
#[derive(Debug, Clone)]
pub struct Client {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uris: Vec<String>,
}

impl Client {
    /// Check a redirect URI against the registered list (exact match).
    #[must_use]
    pub fn has_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == uri)
    }
}

/// An authorization code issued by the authorize endpoint.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub client_id: String,
    pub redirect_uri: String,
    pub resource: String,
    pub scope: String,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl AuthorizationCode {
    /// Check if the code's lifetime has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// An opaque bearer access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub client_id: String,
    pub resource: String,
    pub scope: String,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl AccessToken {
    /// Check if the token's lifetime has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// The principal attached to a request after successful token verification.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub client_id: String,
    pub scope: String,
    pub resource: String,
}
