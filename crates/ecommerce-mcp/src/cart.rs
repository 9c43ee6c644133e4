//! Shared shopping cart state and summary building.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::catalog;

/// Shared cart: product id mapped to quantity.
///
/// Cloning is cheap and shares the underlying map, so the MCP tools and
/// the REST handlers operate on the same cart.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    items: Arc<RwLock<HashMap<String, u64>>>,
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a product. Returns the new quantity of that line.
    pub async fn add(&self, product_id: &str) -> u64 {
        let mut items = self.items.write().await;
        let qty = items.entry(product_id.to_string()).or_insert(0);
        *qty += 1;
        *qty
    }

    /// Remove a product line entirely. Returns false when the line was absent.
    pub async fn remove(&self, product_id: &str) -> bool {
        self.items.write().await.remove(product_id).is_some()
    }

    /// Current cart contents.
    pub async fn snapshot(&self) -> HashMap<String, u64> {
        self.items.read().await.clone()
    }

    /// Drain the cart in one write-lock acquisition and return what it held.
    ///
    /// Checkout uses this so two concurrent checkouts cannot both see a
    /// non-empty cart and both place an order.
    pub async fn take_all(&self) -> HashMap<String, u64> {
        std::mem::take(&mut *self.items.write().await)
    }

    /// Whether the cart has no lines.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

/// One cart line joined against the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: String,
    pub name: String,
    pub quantity: u64,
    pub unit_price: u64,
    pub unit_price_formatted: String,
    pub subtotal: u64,
    pub subtotal_formatted: String,
}

/// Cart summary with per-line and grand totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub total_amount: u64,
    pub total_amount_formatted: String,
    pub total_quantity: u64,
}

impl CartSummary {
    /// Build a summary for the given cart contents.
    ///
    /// Lines follow catalog order. Ids with no catalog entry are skipped.
    #[must_use]
    pub fn build(items: &HashMap<String, u64>) -> Self {
        let mut lines = Vec::new();
        let mut total_amount = 0;
        let mut total_quantity = 0;

        for product in catalog::CATALOG {
            let Some(&quantity) = items.get(product.id) else {
                continue;
            };
            let subtotal = product.price * quantity;
            lines.push(CartLine {
                id: product.id.to_string(),
                name: product.name.to_string(),
                quantity,
                unit_price: product.price,
                unit_price_formatted: format_price(product.price),
                subtotal,
                subtotal_formatted: format_price(subtotal),
            });
            total_amount += subtotal;
            total_quantity += quantity;
        }

        Self {
            items: lines,
            total_amount,
            total_amount_formatted: format_price(total_amount),
            total_quantity,
        }
    }
}

/// Format an integer lira amount the way the storefront displays it,
/// with dot-grouped thousands: `25.000.00 ₺`.
#[must_use]
pub fn format_price(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{grouped}.00 ₺")
}

/// Derive a stable `ORD-nnnn` order id from the drained cart contents.
#[must_use]
pub fn order_id(items: &HashMap<String, u64>) -> String {
    let mut entries: Vec<_> = items.iter().collect();
    entries.sort();
    let mut hasher = DefaultHasher::new();
    entries.hash(&mut hasher);
    format!("ORD-{:04}", hasher.finish() % 10000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_increments_quantity() {
        let cart = CartStore::new();
        assert_eq!(cart.add("p1").await, 1);
        assert_eq!(cart.add("p1").await, 2);
        assert_eq!(cart.snapshot().await.get("p1"), Some(&2));
    }

    #[tokio::test]
    async fn test_remove_deletes_whole_line() {
        let cart = CartStore::new();
        cart.add("p1").await;
        cart.add("p1").await;
        assert!(cart.remove("p1").await);
        assert!(cart.is_empty().await);
        assert!(!cart.remove("p1").await);
    }

    #[tokio::test]
    async fn test_take_all_drains() {
        let cart = CartStore::new();
        cart.add("p1").await;
        cart.add("p3").await;
        let taken = cart.take_all().await;
        assert_eq!(taken.len(), 2);
        assert!(cart.is_empty().await);
        assert!(cart.take_all().await.is_empty());
    }

    #[test]
    fn test_format_price_groups_thousands() {
        assert_eq!(format_price(25000), "25.000.00 ₺");
        assert_eq!(format_price(600), "600.00 ₺");
        assert_eq!(format_price(1_500_000), "1.500.000.00 ₺");
    }

    #[test]
    fn test_summary_totals() {
        let mut items = HashMap::new();
        items.insert("p1".to_string(), 2);
        items.insert("p3".to_string(), 1);

        let summary = CartSummary::build(&items);
        assert_eq!(summary.items.len(), 2);
        assert_eq!(summary.total_amount, 50600);
        assert_eq!(summary.total_quantity, 3);
        assert_eq!(summary.total_amount_formatted, "50.600.00 ₺");
        // Catalog order, not map order.
        assert_eq!(summary.items[0].id, "p1");
        assert_eq!(summary.items[1].id, "p3");
    }

    #[test]
    fn test_summary_skips_unknown_ids() {
        let mut items = HashMap::new();
        items.insert("ghost".to_string(), 5);
        let summary = CartSummary::build(&items);
        assert!(summary.items.is_empty());
        assert_eq!(summary.total_amount, 0);
    }

    #[test]
    fn test_order_id_is_stable() {
        let mut items = HashMap::new();
        items.insert("p1".to_string(), 2);
        items.insert("p2".to_string(), 1);
        let first = order_id(&items);
        let second = order_id(&items);
        assert_eq!(first, second);
        assert!(first.starts_with("ORD-"));
        assert_eq!(first.len(), 8);
    }
}
