//! MCP tool implementations.
//!
//! Each tool module provides functions that:
//! 1. Parse and validate input parameters
//! 2. Operate on the shared catalog and cart state
//! 3. Return the result as a JSON string

mod cart;
mod products;

pub use cart::*;
pub use products::*;

use crate::cart::CartStore;
use crate::error::ToolResult;

/// Tool execution context.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Shared cart, also served by the REST API.
    pub cart: CartStore,
}

impl ToolContext {
    /// Create a new tool context.
    #[must_use]
    pub fn new(cart: CartStore) -> Self {
        Self { cart }
    }
}

/// Trait for MCP tools.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name (e.g., "add_to_cart").
    fn name(&self) -> &'static str;

    /// Tool description for LLM.
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with given input.
    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String>;
}

/// Register all tools.
#[must_use]
pub fn register_all_tools() -> Vec<Box<dyn McpTool>> {
    vec![
        Box::new(products::SearchProductsTool),
        Box::new(cart::AddToCartTool),
        Box::new(cart::RemoveFromCartTool),
        Box::new(cart::GetCartTool),
        Box::new(cart::CheckoutTool),
    ]
}
