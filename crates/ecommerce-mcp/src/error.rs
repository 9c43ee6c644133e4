//! Error types for the e-commerce MCP server.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use axum::http::StatusCode;

/// Errors from the embedded OAuth authorization server.
///
/// Each variant maps to one RFC 6749 error code and one HTTP status, so
/// handlers can turn any of these into a wire error response.
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    /// Registration payload is missing required metadata (empty `redirect_uris`)
    #[error("Invalid client metadata: {message}")]
    InvalidClientMetadata {
        /// What was wrong with the registration request
        message: String,
    },

    /// Unknown client id or wrong client secret
    #[error("Client authentication failed")]
    InvalidClient,

    /// The redirect URI is not registered for this client
    #[error("Redirect URI not registered: {uri}")]
    InvalidRedirectUri {
        /// The rejected URI
        uri: String,
    },

    /// The grant is unusable: unknown code, consumed code, mismatched
    /// client or redirect URI, or a failed PKCE check
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Why the grant was rejected
        message: String,
    },

    /// The authorization code exists but its lifetime has passed
    #[error("Authorization code expired")]
    ExpiredCode,

    /// `grant_type` is neither `authorization_code` nor `client_credentials`
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The rejected grant type
        grant_type: String,
    },

    /// Missing, unknown, or expired bearer token on a protected route
    #[error("Invalid or expired access token")]
    InvalidToken,
}

impl AuthError {
    /// Create an invalid-metadata error.
    #[must_use]
    pub fn invalid_client_metadata(message: impl Into<String>) -> Self {
        Self::InvalidClientMetadata { message: message.into() }
    }

    /// Create an invalid-redirect error.
    #[must_use]
    pub fn invalid_redirect_uri(uri: impl Into<String>) -> Self {
        Self::InvalidRedirectUri { uri: uri.into() }
    }

    /// Create an invalid-grant error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant { message: message.into() }
    }

    /// Create an unsupported-grant-type error.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType { grant_type: grant_type.into() }
    }

    /// The RFC 6749 / registration error code for the response body.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidClientMetadata { .. } => "invalid_client_metadata",
            Self::InvalidClient => "invalid_client",
            Self::InvalidRedirectUri { .. } => "invalid_redirect_uri",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::ExpiredCode => "expired_code",
            Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
            Self::InvalidToken => "invalid_token",
        }
    }

    /// HTTP status for the error response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidClient => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Errors from MCP tool execution.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// Input validation failed
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal tool logic error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Convert to a user-friendly error message for MCP response.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Validation { field, message } => {
                format!("Invalid input for '{field}': {message}")
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
