//! E-Commerce MCP Server
//!
//! A Model Context Protocol (MCP) server for a demo e-commerce
//! storefront. Enables LLM agents to search a product catalog, manage a
//! shared shopping cart, and place orders.
//!
//! # Features
//!
//! - **5 MCP Tools**: Product search, cart add/remove/view, checkout
//! - **Dual surface**: The same catalog and cart behind MCP and REST
//! - **Embedded OAuth 2.0**: Dynamic registration, PKCE, bearer tokens
//! - **Async-first**: Built on Tokio and Axum
//!
//! # Example
//!
//! ```no_run
//! use ecommerce_mcp::{config::Config, server::McpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config);
//!     server.run_http(8000).await
//! }
//! ```

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod server;
pub mod tools;

pub use cart::CartStore;
pub use config::Config;
pub use error::{AuthError, ToolError};
