//! Product Model
//!
//! Products are owned by the catalog; this core reads them and mutates only
//! `stock_quantity`/`version` through the stock ledger.

use serde::{Deserialize, Serialize};

/// Product lifecycle status
///
/// `Deleted` rows are filtered at the repository layer; callers cannot tell
/// a deleted product from a missing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ProductStatus {
    Active,
    Inactive,
    Deleted,
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub name: String,
    pub status: ProductStatus,
    /// Retail display unit (e.g. "kg", "bunch")
    pub unit: String,
    /// Seller region, used by shipping and the wholesale region rule
    pub region: String,
    pub retail_price: f64,
    pub wholesale_enabled: bool,
    pub wholesale_base_price: Option<f64>,
    /// Display unit override for wholesale pricing (e.g. "crate")
    pub wholesale_unit: Option<String>,
    pub stock_quantity: i64,
    /// Optimistic concurrency guard for stock writes
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Whether the product can currently be ordered
    pub fn is_sellable(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

/// Wholesale price tier: applies when the requested quantity meets or
/// exceeds `min_quantity`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PriceTier {
    pub id: i64,
    pub product_id: i64,
    pub min_quantity: i64,
    pub unit_price: f64,
}

/// Create product payload (catalog seeding)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub seller_id: i64,
    pub name: String,
    pub unit: String,
    pub region: String,
    pub retail_price: f64,
    pub wholesale_enabled: bool,
    pub wholesale_base_price: Option<f64>,
    pub wholesale_unit: Option<String>,
    pub stock_quantity: i64,
    pub tiers: Vec<PriceTierCreate>,
}

/// Create price tier payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTierCreate {
    pub min_quantity: i64,
    pub unit_price: f64,
}
