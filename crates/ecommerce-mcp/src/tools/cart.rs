//! Cart and checkout tools.
//!
//! The response builders are shared with the REST cart routes so both
//! surfaces return identical payloads.

use serde::Deserialize;

use crate::cart::{self, CartStore, CartSummary};
use crate::catalog;
use crate::error::ToolResult;

use super::{McpTool, ToolContext};

/// Add a product to the cart and return the updated summary.
pub async fn add_to_cart_response(store: &CartStore, product_id: &str) -> serde_json::Value {
    let Some(product) = catalog::get(product_id) else {
        return serde_json::json!({
            "success": false,
            "message": "Ürün bulunamadı"
        });
    };

    store.add(product_id).await;
    let summary = CartSummary::build(&store.snapshot().await);

    serde_json::json!({
        "success": true,
        "message": format!("{} sepete eklendi", product.name),
        "cart": summary
    })
}

/// Remove a product from the cart and return the updated summary.
pub async fn remove_from_cart_response(store: &CartStore, product_id: &str) -> serde_json::Value {
    if !store.remove(product_id).await {
        return serde_json::json!({
            "success": false,
            "message": "Ürün sepette değil"
        });
    }

    let summary = CartSummary::build(&store.snapshot().await);

    serde_json::json!({
        "success": true,
        "message": "Ürün sepetten çıkarıldı",
        "cart": summary
    })
}

/// Return the current cart contents.
pub async fn get_cart_response(store: &CartStore) -> serde_json::Value {
    let snapshot = store.snapshot().await;
    let summary = CartSummary::build(&snapshot);

    if snapshot.is_empty() {
        serde_json::json!({
            "isEmpty": true,
            "message": "Sepetiniz boş",
            "cart": summary
        })
    } else {
        serde_json::json!({
            "isEmpty": false,
            "message": format!("Sepetinizde {} ürün var", summary.total_quantity),
            "cart": summary
        })
    }
}

/// Place an order from the cart contents, emptying the cart.
pub async fn checkout_response(store: &CartStore) -> serde_json::Value {
    // take_all drains atomically, so two concurrent checkouts cannot
    // both see the same items.
    let taken = store.take_all().await;
    if taken.is_empty() {
        return serde_json::json!({
            "success": false,
            "message": "Sepet boş, sipariş verilemez"
        });
    }

    let summary = CartSummary::build(&taken);
    let order = serde_json::json!({
        "orderId": cart::order_id(&taken),
        "items": summary.items,
        "total": summary.total_amount_formatted,
        "itemCount": summary.total_quantity
    });

    serde_json::json!({
        "success": true,
        "message": format!("Siparişiniz alındı! Toplam: {}", summary.total_amount_formatted),
        "order": order
    })
}

#[derive(Debug, Deserialize)]
struct ProductIdInput {
    #[serde(rename = "productId")]
    product_id: String,
}

fn product_id_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "productId": {
                "type": "string",
                "description": "Ürün kimliği (örn. p1)"
            }
        },
        "required": ["productId"]
    })
}

/// Add a catalog product to the shared cart.
pub struct AddToCartTool;

#[async_trait::async_trait]
impl McpTool for AddToCartTool {
    fn name(&self) -> &'static str {
        "add_to_cart"
    }

    fn description(&self) -> &'static str {
        "Sepete ürün ekle"
    }

    fn input_schema(&self) -> serde_json::Value {
        product_id_schema()
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let input: ProductIdInput = serde_json::from_value(input)?;
        let response = add_to_cart_response(&ctx.cart, &input.product_id).await;
        Ok(serde_json::to_string(&response)?)
    }
}

/// Remove one unit of a product from the cart.
pub struct RemoveFromCartTool;

#[async_trait::async_trait]
impl McpTool for RemoveFromCartTool {
    fn name(&self) -> &'static str {
        "remove_from_cart"
    }

    fn description(&self) -> &'static str {
        "Sepetten ürün çıkar"
    }

    fn input_schema(&self) -> serde_json::Value {
        product_id_schema()
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let input: ProductIdInput = serde_json::from_value(input)?;
        let response = remove_from_cart_response(&ctx.cart, &input.product_id).await;
        Ok(serde_json::to_string(&response)?)
    }
}

/// Show the current cart with line totals.
pub struct GetCartTool;

#[async_trait::async_trait]
impl McpTool for GetCartTool {
    fn name(&self) -> &'static str {
        "get_cart"
    }

    fn description(&self) -> &'static str {
        "Sepeti göster"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        let response = get_cart_response(&ctx.cart).await;
        Ok(serde_json::to_string(&response)?)
    }
}

/// Place an order from the cart contents.
pub struct CheckoutTool;

#[async_trait::async_trait]
impl McpTool for CheckoutTool {
    fn name(&self) -> &'static str {
        "checkout"
    }

    fn description(&self) -> &'static str {
        "Siparişi tamamla ve öde"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        let response = checkout_response(&ctx.cart).await;
        Ok(serde_json::to_string(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ToolContext {
        ToolContext::new(CartStore::default())
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let ctx = ctx();
        let result = AddToCartTool
            .execute(&ctx, serde_json::json!({"productId": "p99"}))
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["message"], "Ürün bulunamadı");
    }

    #[tokio::test]
    async fn test_add_and_get_cart() {
        let ctx = ctx();
        AddToCartTool
            .execute(&ctx, serde_json::json!({"productId": "p1"}))
            .await
            .unwrap();
        AddToCartTool
            .execute(&ctx, serde_json::json!({"productId": "p1"}))
            .await
            .unwrap();

        let result = GetCartTool.execute(&ctx, serde_json::json!({})).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(parsed["isEmpty"], false);
        assert_eq!(parsed["message"], "Sepetinizde 2 ürün var");
        assert_eq!(parsed["cart"]["items"][0]["quantity"], 2);
    }

    #[tokio::test]
    async fn test_remove_missing_product() {
        let ctx = ctx();
        let result = RemoveFromCartTool
            .execute(&ctx, serde_json::json!({"productId": "p3"}))
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["message"], "Ürün sepette değil");
    }

    #[tokio::test]
    async fn test_get_empty_cart() {
        let ctx = ctx();
        let result = GetCartTool.execute(&ctx, serde_json::json!({})).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(parsed["isEmpty"], true);
        assert_eq!(parsed["message"], "Sepetiniz boş");
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let ctx = ctx();
        let result = CheckoutTool.execute(&ctx, serde_json::json!({})).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["message"], "Sepet boş, sipariş verilemez");
    }

    #[tokio::test]
    async fn test_checkout_empties_cart() {
        let ctx = ctx();
        AddToCartTool
            .execute(&ctx, serde_json::json!({"productId": "p3"}))
            .await
            .unwrap();

        let result = CheckoutTool.execute(&ctx, serde_json::json!({})).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(parsed["success"], true);
        assert_eq!(parsed["order"]["total"], "600.00 ₺");
        assert_eq!(parsed["order"]["itemCount"], 1);
        assert!(parsed["order"]["orderId"].as_str().unwrap().starts_with("ORD-"));

        assert!(ctx.cart.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_product_id_is_validation_error() {
        let ctx = ctx();
        let result = AddToCartTool.execute(&ctx, serde_json::json!({})).await;
        assert!(result.is_err());
    }
}
