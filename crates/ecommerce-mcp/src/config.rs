//! Configuration for the e-commerce MCP server.

/// OAuth protocol constants.
pub mod oauth {
    use std::time::Duration;

    /// Lifetime of an authorization code.
    pub const CODE_TTL: Duration = Duration::from_secs(300);

    /// Lifetime of an access token.
    pub const TOKEN_TTL: Duration = Duration::from_secs(3600);

    /// The only scope this server issues.
    pub const DEFAULT_SCOPE: &str = "mcp";

    /// Client authentication method advertised and accepted.
    pub const AUTH_METHOD: &str = "client_secret_post";
}

/// Default public base URL when `BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://obasemarket.azurewebsites.net";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Public base URL of this server (issuer and metadata host).
    pub base_url: String,

    /// Canonical resource identifier that tokens are bound to.
    pub resource_id: String,
}

impl Config {
    /// Create a new configuration.
    ///
    /// The resource identifier defaults to the base URL when not given,
    /// so the server acts as its own protected resource.
    #[must_use]
    pub fn new(base_url: impl Into<String>, resource_id: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let resource_id = resource_id.unwrap_or_else(|| base_url.clone());
        Self { base_url, resource_id }
    }

    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let resource_id = std::env::var("RESOURCE_ID").ok();
        Self::new(base_url, resource_id)
    }

    /// Create a test configuration with a fixed base URL.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self::new(base_url, None)
    }

    /// URL of the protected-resource metadata document.
    #[must_use]
    pub fn resource_metadata_url(&self) -> String {
        format!("{}/.well-known/oauth-protected-resource", self.base_url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, None)
    }
}
