//! Shipping Calculator
//!
//! Flat fees by region match and order class. Wholesale orders never cross
//! regions: bulk freight is only arranged within a seller's own region.

use shared::error::{AppError, AppResult};
use shared::models::OrderClass;

/// Retail delivery inside the seller's region
pub const RETAIL_LOCAL_FEE: f64 = 15.0;
/// Retail delivery to another region
pub const RETAIL_REMOTE_FEE: f64 = 30.0;
/// Wholesale freight inside the seller's region
pub const WHOLESALE_LOCAL_FEE: f64 = 20.0;

/// Compute the shipping fee for one seller group.
///
/// Fails `Invalid` for a cross-region wholesale order; this runs before any
/// stock mutation.
pub fn shipping_fee(seller_region: &str, buyer_region: &str, class: OrderClass) -> AppResult<f64> {
    let same_region = seller_region == buyer_region;
    match class {
        OrderClass::Retail => Ok(if same_region {
            RETAIL_LOCAL_FEE
        } else {
            RETAIL_REMOTE_FEE
        }),
        OrderClass::Wholesale => {
            if !same_region {
                return Err(AppError::invalid(format!(
                    "Wholesale orders cannot cross regions (seller: {seller_region}, buyer: {buyer_region})"
                )));
            }
            Ok(WHOLESALE_LOCAL_FEE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retail_fees() {
        assert_eq!(
            shipping_fee("north", "north", OrderClass::Retail).unwrap(),
            RETAIL_LOCAL_FEE
        );
        assert_eq!(
            shipping_fee("north", "south", OrderClass::Retail).unwrap(),
            RETAIL_REMOTE_FEE
        );
    }

    #[test]
    fn test_wholesale_same_region() {
        assert_eq!(
            shipping_fee("north", "north", OrderClass::Wholesale).unwrap(),
            WHOLESALE_LOCAL_FEE
        );
    }

    #[test]
    fn test_wholesale_cross_region_rejected() {
        let err = shipping_fee("north", "south", OrderClass::Wholesale).unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));
        assert!(format!("{err}").contains("cross regions"));
    }
}
