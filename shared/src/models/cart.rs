//! Cart Model
//!
//! Cart storage is a simple keyed-by-buyer collection; checkout reads it as
//! a snapshot and removes only the lines it actually converted.

use serde::{Deserialize, Serialize};

/// One cart line for one buyer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: i64,
    pub buyer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub created_at: i64,
}

/// Add-to-cart payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineCreate {
    pub product_id: i64,
    pub quantity: i64,
}
