//! Authentication
//!
//! JWT bearer tokens carrying the actor's id, role and buyer class.
//! Token issuance lives with user administration; this core only validates.

mod extractor;
pub mod jwt;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService};

use shared::error::AppError;
use shared::models::{OrderClass, Role};

/// The authenticated actor on a request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
    /// Pricing regime this account checks out under
    pub buyer_class: OrderClass,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::invalid_token(format!("Malformed subject: {}", claims.sub)))?;
        let role = Role::parse(&claims.role)
            .ok_or_else(|| AppError::invalid_token(format!("Unknown role: {}", claims.role)))?;
        let buyer_class = match claims.class.as_deref() {
            Some("WHOLESALE") => OrderClass::Wholesale,
            _ => OrderClass::Retail,
        };
        Ok(Self {
            id,
            role,
            buyer_class,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: &str, class: Option<&str>) -> Claims {
        Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            class: class.map(|s| s.to_string()),
            exp: 0,
            iat: 0,
            iss: "market-server".to_string(),
            aud: "market-clients".to_string(),
        }
    }

    #[test]
    fn test_current_user_from_claims() {
        let user = CurrentUser::try_from(claims("42", "BUYER", Some("WHOLESALE"))).unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.role, Role::Buyer);
        assert_eq!(user.buyer_class, OrderClass::Wholesale);
    }

    #[test]
    fn test_missing_class_defaults_to_retail() {
        let user = CurrentUser::try_from(claims("1", "SELLER", None)).unwrap();
        assert_eq!(user.buyer_class, OrderClass::Retail);
    }

    #[test]
    fn test_bad_claims_rejected() {
        assert!(CurrentUser::try_from(claims("not-a-number", "BUYER", None)).is_err());
        assert!(CurrentUser::try_from(claims("1", "SUPERUSER", None)).is_err());
    }
}
