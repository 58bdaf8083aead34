//! Shipping Address Model

use serde::{Deserialize, Serialize};

/// Saved shipping address, owned by one user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub recipient: String,
    pub phone: String,
    pub line: String,
    pub region: String,
    pub is_active: bool,
    pub created_at: i64,
}

impl Address {
    /// Ownership predicate
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}
