//! Payment Model

use serde::{Deserialize, Serialize};

/// Payment record state
///
/// `Success` and `Failed` are terminal: a payment never transitions out of
/// them, which is what makes redelivered gateway callbacks safe to ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentState {
    Pending,
    Success,
    Failed,
}

impl PaymentState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Payment attempt against one order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub amount: f64,
    /// Gateway identifier ("cash" for the synthetic delivery payment)
    pub gateway: String,
    /// External transaction code reported by the gateway
    pub transaction_code: Option<String>,
    pub status: PaymentState,
    pub payment_time: Option<i64>,
    pub gateway_message: Option<String>,
    pub created_at: i64,
}
