//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary arithmetic goes through `Decimal`; values are stored and
//! serialized as `f64` rounded to 2 decimal places, half-up.

use rust_decimal::prelude::*;
use shared::error::AppError;

/// Rounding: 2 decimal places, half-up
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed unit price
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per order line
pub const MAX_QUANTITY: i64 = 9999;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

/// Line total: unit_price * quantity, rounded
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Order total: subtotal + shipping - discount, rounded
pub fn order_total(subtotal: f64, shipping_fee: f64, discount: f64) -> f64 {
    to_f64(to_decimal(subtotal) + to_decimal(shipping_fee) - to_decimal(discount))
}

/// Validate a requested order-line quantity
pub fn validate_quantity(quantity: i64) -> Result<(), AppError> {
    if quantity <= 0 {
        return Err(AppError::invalid(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::invalid(format!(
            "quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}

/// Validate a price coming from catalog data or a gateway payload
pub fn validate_price(value: f64, field_name: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::invalid(format!(
            "{field_name} must be a finite number, got {value}"
        )));
    }
    if value < 0.0 {
        return Err(AppError::invalid(format!(
            "{field_name} must be non-negative, got {value}"
        )));
    }
    if value > MAX_PRICE {
        return Err(AppError::invalid(format!(
            "{field_name} exceeds maximum allowed ({MAX_PRICE}), got {value}"
        )));
    }
    Ok(())
}
