//! Product search tool.

use serde::Deserialize;

use crate::catalog;
use crate::error::ToolResult;

use super::{McpTool, ToolContext};

/// Build the search response payload, shared with the REST catalog route.
#[must_use]
pub fn search_products_response(query: &str) -> serde_json::Value {
    let products = catalog::search(query);
    let count = products.len();
    serde_json::json!({
        "products": products,
        "count": count,
        "message": format!("{count} ürün bulundu")
    })
}

#[derive(Debug, Deserialize)]
struct SearchProductsInput {
    #[serde(default)]
    query: String,
}

/// Search the product catalog by name or description.
pub struct SearchProductsTool;

#[async_trait::async_trait]
impl McpTool for SearchProductsTool {
    fn name(&self) -> &'static str {
        "search_products"
    }

    fn description(&self) -> &'static str {
        "Katalogda ürün ara. Boş sorgu tüm ürünleri döndürür."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Ürün adı veya açıklamasında aranacak metin"
                }
            }
        })
    }

    async fn execute(&self, _ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let input: SearchProductsInput = serde_json::from_value(input)?;
        let response = search_products_response(&input.query);
        Ok(serde_json::to_string(&response)?)
    }
}
