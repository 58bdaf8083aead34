//! Order Model
//!
//! One Order per seller group; a multi-seller cart yields N independent
//! orders. Orders are never physically deleted.

use serde::{Deserialize, Serialize};

use super::payment::Payment;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipping,
    Delivered,
    Cancelled,
    Returned,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipping => "SHIPPING",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Returned => "RETURNED",
        };
        f.write_str(s)
    }
}

/// Retail vs wholesale pricing/shipping regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderClass {
    Retail,
    Wholesale,
}

/// How the buyer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentMethod {
    /// Online payment through an external gateway
    Gateway,
    CashOnDelivery,
    /// Invoice against a purchase order, settled on terms
    PurchaseOrder,
}

impl PaymentMethod {
    /// Initial order payment status for this method
    pub fn initial_payment_status(&self) -> PaymentStatus {
        match self {
            Self::PurchaseOrder => PaymentStatus::AwaitingTerm,
            Self::Gateway | Self::CashOnDelivery => PaymentStatus::Pending,
        }
    }
}

/// Order-level settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentStatus {
    Pending,
    AwaitingTerm,
    Paid,
    Failed,
    /// Paid order was cancelled/returned; refund needs manual follow-up
    Refunded,
}

/// Order aggregate root
///
/// Invariant: `total_amount == subtotal + shipping_fee - discount`, never
/// negative. The shipping address is denormalized at creation so later
/// address edits cannot rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Buyer-facing code, also the join key for gateway callbacks
    pub code: String,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub order_class: OrderClass,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub subtotal: f64,
    pub shipping_fee: f64,
    pub discount: f64,
    pub total_amount: f64,
    pub ship_to_name: String,
    pub ship_to_phone: String,
    pub ship_to_line: String,
    pub ship_to_region: String,
    pub notes: Option<String>,
    pub purchase_order_number: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Ownership predicate: the buyer who placed the order
    pub fn is_buyer(&self, user_id: i64) -> bool {
        self.buyer_id == user_id
    }

    /// Ownership predicate: the seller fulfilling the order
    pub fn is_seller(&self, user_id: i64) -> bool {
        self.seller_id == user_id
    }
}

/// Immutable priced line snapshot, decoupled from later catalog changes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub line_total: f64,
}

/// Full order detail (order + lines + payments)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub payments: Vec<Payment>,
}
