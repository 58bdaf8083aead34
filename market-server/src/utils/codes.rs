//! Order code generation
//!
//! Codes are the buyer-facing identifier and the join key for gateway
//! callbacks: `ORD<yymmdd>-<4 random digits>`, globally unique.

use rand::Rng;

/// Prefix for all order codes
pub const ORDER_CODE_PREFIX: &str = "ORD";

/// Generate one candidate order code for the current UTC date.
///
/// Uniqueness is not guaranteed here; callers re-draw against the order
/// store until an unused code is found.
pub fn generate_order_code() -> String {
    let date = chrono::Utc::now().format("%y%m%d");
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{ORDER_CODE_PREFIX}{date}-{suffix:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_format() {
        let code = generate_order_code();
        // ORD + 6 date digits + '-' + 4 random digits
        assert_eq!(code.len(), 3 + 6 + 1 + 4);
        assert!(code.starts_with("ORD"));
        let (date_part, rand_part) = code[3..].split_once('-').unwrap();
        assert_eq!(date_part.len(), 6);
        assert!(date_part.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rand_part.len(), 4);
        assert!(rand_part.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_codes_vary() {
        // 4 random digits: 100 draws colliding every time is effectively impossible
        let first = generate_order_code();
        let distinct = (0..100).any(|_| generate_order_code() != first);
        assert!(distinct);
    }
}
