//! Embedded OAuth 2.0 authorization server.
//!
//! A self-contained, in-memory authorization server protecting the MCP and
//! REST surfaces of this binary.
//!
//! ## Supported Standards
//! - RFC 9728: OAuth Protected Resource Metadata
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256)
//! - RFC 6749: Authorization Code and Client Credentials grants

pub mod handlers;
pub mod pkce;
pub mod store;
pub mod types;
pub mod verifier;

pub use store::AuthServerState;
pub use types::TokenInfo;
