//! Discount Calculator
//!
//! Fixed threshold tiers per order class: the highest threshold the
//! subtotal meets wins. There is no percentage path.

use shared::models::OrderClass;

/// (subtotal threshold, discount amount), ascending
const RETAIL_TIERS: &[(f64, f64)] = &[(300.0, 15.0), (500.0, 30.0), (1000.0, 75.0)];
const WHOLESALE_TIERS: &[(f64, f64)] = &[(1000.0, 50.0), (3000.0, 180.0), (5000.0, 400.0)];

/// Discount amount for an order subtotal
pub fn discount_for(class: OrderClass, subtotal: f64) -> f64 {
    let tiers = match class {
        OrderClass::Retail => RETAIL_TIERS,
        OrderClass::Wholesale => WHOLESALE_TIERS,
    };
    tiers
        .iter()
        .rev()
        .find(|(threshold, _)| subtotal >= *threshold)
        .map(|(_, amount)| *amount)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_first_threshold_no_discount() {
        assert_eq!(discount_for(OrderClass::Retail, 299.99), 0.0);
        assert_eq!(discount_for(OrderClass::Wholesale, 999.99), 0.0);
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        assert_eq!(discount_for(OrderClass::Retail, 300.0), 15.0);
        assert_eq!(discount_for(OrderClass::Wholesale, 1000.0), 50.0);
    }

    #[test]
    fn test_highest_met_threshold_wins() {
        assert_eq!(discount_for(OrderClass::Retail, 750.0), 30.0);
        assert_eq!(discount_for(OrderClass::Retail, 10_000.0), 75.0);
        assert_eq!(discount_for(OrderClass::Wholesale, 4_500.0), 180.0);
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        // The tables keep amounts far under their thresholds, which is what
        // keeps total_amount non-negative
        for tiers in [RETAIL_TIERS, WHOLESALE_TIERS] {
            for (threshold, amount) in tiers {
                assert!(amount < threshold);
            }
        }
    }
}
