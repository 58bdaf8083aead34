//! Pricing Engine
//!
//! Resolves the unit price and display unit for a product at a requested
//! quantity and order class.

use shared::models::{OrderClass, PriceTier, Product};

/// Resolved price for one order line
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub unit_price: f64,
    pub unit: String,
}

/// Price a product for the requested quantity.
///
/// Wholesale orders on wholesale-enabled products pick the highest
/// `min_quantity` tier the quantity satisfies, falling back to the
/// wholesale base price when no tier matches (and to the retail price when
/// no base is configured). Everything else prices retail.
pub fn price(product: &Product, tiers: &[PriceTier], quantity: i64, class: OrderClass) -> Quote {
    if class == OrderClass::Wholesale && product.wholesale_enabled {
        let tier_price = tiers
            .iter()
            .filter(|t| quantity >= t.min_quantity)
            .max_by_key(|t| t.min_quantity)
            .map(|t| t.unit_price);

        let unit_price = tier_price
            .or(product.wholesale_base_price)
            .unwrap_or(product.retail_price);

        let unit = product
            .wholesale_unit
            .clone()
            .unwrap_or_else(|| product.unit.clone());

        return Quote { unit_price, unit };
    }

    Quote {
        unit_price: product.retail_price,
        unit: product.unit.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::ProductStatus;
    use shared::util::now_millis;

    fn product(wholesale_enabled: bool, wholesale_base_price: Option<f64>) -> Product {
        let now = now_millis();
        Product {
            id: 1,
            seller_id: 10,
            name: "Potatoes".to_string(),
            status: ProductStatus::Active,
            unit: "kg".to_string(),
            region: "north".to_string(),
            retail_price: 2.50,
            wholesale_enabled,
            wholesale_base_price,
            wholesale_unit: Some("sack".to_string()),
            stock_quantity: 1000,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn tiers() -> Vec<PriceTier> {
        vec![
            PriceTier { id: 1, product_id: 1, min_quantity: 20, unit_price: 2.00 },
            PriceTier { id: 2, product_id: 1, min_quantity: 50, unit_price: 1.80 },
            PriceTier { id: 3, product_id: 1, min_quantity: 100, unit_price: 1.60 },
        ]
    }

    #[test]
    fn test_retail_always_uses_retail_price() {
        let p = product(true, Some(2.20));
        let quote = price(&p, &tiers(), 500, OrderClass::Retail);
        assert_eq!(quote.unit_price, 2.50);
        assert_eq!(quote.unit, "kg");
    }

    #[test]
    fn test_wholesale_picks_highest_satisfied_tier() {
        let p = product(true, Some(2.20));
        let quote = price(&p, &tiers(), 75, OrderClass::Wholesale);
        assert_eq!(quote.unit_price, 1.80);
        assert_eq!(quote.unit, "sack");

        let quote = price(&p, &tiers(), 100, OrderClass::Wholesale);
        assert_eq!(quote.unit_price, 1.60);
    }

    #[test]
    fn test_wholesale_below_all_tiers_uses_base_price() {
        let p = product(true, Some(2.20));
        let quote = price(&p, &tiers(), 10, OrderClass::Wholesale);
        assert_eq!(quote.unit_price, 2.20);
    }

    #[test]
    fn test_wholesale_without_base_falls_back_to_retail() {
        let p = product(true, None);
        let quote = price(&p, &[], 10, OrderClass::Wholesale);
        assert_eq!(quote.unit_price, 2.50);
        // Unit override still applies for wholesale pricing
        assert_eq!(quote.unit, "sack");
    }

    #[test]
    fn test_not_wholesale_enabled_always_retail() {
        let p = product(false, Some(2.20));
        let quote = price(&p, &tiers(), 500, OrderClass::Wholesale);
        assert_eq!(quote.unit_price, 2.50);
        assert_eq!(quote.unit, "kg");
    }

    #[test]
    fn test_exact_tier_boundary_is_inclusive() {
        let p = product(true, Some(2.20));
        let quote = price(&p, &tiers(), 20, OrderClass::Wholesale);
        assert_eq!(quote.unit_price, 2.00);
    }
}
