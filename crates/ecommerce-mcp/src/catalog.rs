//! Demo product catalog.
//!
//! A fixed in-memory storefront of four products. Search is a
//! case-insensitive substring match over name and description.

use serde::Serialize;

/// A catalog product. Prices are integer lira.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u64,
    pub description: &'static str,
}

/// The full demo catalog.
pub const CATALOG: &[Product] = &[
    Product { id: "p1", name: "Laptop", price: 25000, description: "14'' iş laptopu" },
    Product { id: "p2", name: "Kulaklık", price: 1500, description: "Bluetooth kulaklık" },
    Product { id: "p3", name: "Mouse", price: 600, description: "Kablosuz mouse" },
    Product { id: "p4", name: "Klavye", price: 900, description: "Mekanik klavye" },
];

/// Look up a product by id.
#[must_use]
pub fn get(id: &str) -> Option<&'static Product> {
    CATALOG.iter().find(|p| p.id == id)
}

/// Search the catalog. An empty query returns everything.
#[must_use]
pub fn search(query: &str) -> Vec<&'static Product> {
    if query.is_empty() {
        return CATALOG.iter().collect();
    }
    let q = query.to_lowercase();
    CATALOG
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&q) || p.description.to_lowercase().contains(&q))
        .collect()
}
