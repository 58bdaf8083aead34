//! Order status transition table
//!
//! Authorization is data, not branching prose: every legal `from -> to`
//! move names the actors allowed to make it. Anything not in the table is
//! rejected, including self-transitions and moves out of terminal states.

use crate::auth::CurrentUser;
use shared::error::{AppError, AppResult};
use shared::models::{Order, OrderStatus, Role};

/// Who may perform a transition, relative to the order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRule {
    /// The seller the order belongs to
    OwningSeller,
    /// The buyer who placed the order
    OwningBuyer,
    /// Any administrator
    Admin,
}

use ActorRule::*;
use OrderStatus::*;

/// The legal transitions
pub const TRANSITIONS: &[(OrderStatus, OrderStatus, &[ActorRule])] = &[
    (Pending, Confirmed, &[OwningSeller, Admin]),
    (Confirmed, Processing, &[OwningSeller, Admin]),
    (Processing, Shipping, &[OwningSeller, Admin]),
    (Shipping, Delivered, &[OwningSeller, Admin]),
    (Pending, Cancelled, &[OwningBuyer, Admin]),
    (Confirmed, Cancelled, &[OwningBuyer, Admin]),
    (Delivered, Returned, &[Admin]),
];

/// Actors allowed for `from -> to`, or None when the move is illegal
pub fn allowed_actors(from: OrderStatus, to: OrderStatus) -> Option<&'static [ActorRule]> {
    TRANSITIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, actors)| *actors)
}

fn actor_matches(rule: ActorRule, order: &Order, user: &CurrentUser) -> bool {
    match rule {
        OwningSeller => user.role == Role::Seller && order.is_seller(user.id),
        OwningBuyer => user.role == Role::Buyer && order.is_buyer(user.id),
        Admin => user.role == Role::Admin,
    }
}

/// Validate a requested transition against the table and the actor.
///
/// Illegal moves fail `Invalid` reporting the rejected `from -> to` pair;
/// legal moves by the wrong actor fail `Forbidden`.
pub fn authorize(order: &Order, user: &CurrentUser, to: OrderStatus) -> AppResult<()> {
    let from = order.status;
    let actors = allowed_actors(from, to).ok_or_else(|| {
        AppError::invalid(format!("Illegal status transition {from} -> {to}"))
    })?;

    if actors.iter().any(|rule| actor_matches(*rule, order, user)) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "{} may not move order {} from {from} to {to}",
            user.role, order.code
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{OrderClass, PaymentMethod, PaymentStatus};
    use shared::util::now_millis;

    fn order(status: OrderStatus) -> Order {
        let now = now_millis();
        Order {
            id: 1,
            code: "ORD250101-0001".to_string(),
            buyer_id: 10,
            seller_id: 20,
            order_class: OrderClass::Retail,
            status,
            payment_method: PaymentMethod::Gateway,
            payment_status: PaymentStatus::Pending,
            subtotal: 40.0,
            shipping_fee: 15.0,
            discount: 0.0,
            total_amount: 55.0,
            ship_to_name: "Ana".into(),
            ship_to_phone: "555-0101".into(),
            ship_to_line: "12 Orchard Way".into(),
            ship_to_region: "north".into(),
            notes: None,
            purchase_order_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn user(id: i64, role: Role) -> CurrentUser {
        CurrentUser {
            id,
            role,
            buyer_class: OrderClass::Retail,
        }
    }

    #[test]
    fn test_owning_seller_confirms_pending() {
        let o = order(Pending);
        assert!(authorize(&o, &user(20, Role::Seller), Confirmed).is_ok());
    }

    #[test]
    fn test_other_seller_is_forbidden() {
        let o = order(Pending);
        let err = authorize(&o, &user(99, Role::Seller), Confirmed).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_backwards_transition_is_invalid() {
        let o = order(Shipping);
        let err = authorize(&o, &user(20, Role::Seller), Pending).unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));
        assert!(format!("{err}").contains("SHIPPING -> PENDING"));
    }

    #[test]
    fn test_self_transition_is_invalid() {
        let o = order(Confirmed);
        let err = authorize(&o, &user(20, Role::Seller), Confirmed).unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));
    }

    #[test]
    fn test_seller_may_not_cancel() {
        let o = order(Pending);
        let err = authorize(&o, &user(20, Role::Seller), Cancelled).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_buyer_cancels_pending_and_confirmed_only() {
        assert!(authorize(&order(Pending), &user(10, Role::Buyer), Cancelled).is_ok());
        assert!(authorize(&order(Confirmed), &user(10, Role::Buyer), Cancelled).is_ok());
        let err = authorize(&order(Processing), &user(10, Role::Buyer), Cancelled).unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));
    }

    #[test]
    fn test_admin_can_drive_the_whole_lifecycle() {
        let admin = user(1, Role::Admin);
        for (from, to) in [
            (Pending, Confirmed),
            (Confirmed, Processing),
            (Processing, Shipping),
            (Shipping, Delivered),
            (Delivered, Returned),
        ] {
            assert!(authorize(&order(from), &admin, to).is_ok(), "{from} -> {to}");
        }
    }

    #[test]
    fn test_terminal_states_accept_nothing_else() {
        let admin = user(1, Role::Admin);
        for terminal in [Cancelled, Returned] {
            for to in [Pending, Confirmed, Processing, Shipping, Delivered, Cancelled] {
                assert!(authorize(&order(terminal), &admin, to).is_err());
            }
        }
        // Delivered only allows Returned
        assert!(authorize(&order(Delivered), &admin, Confirmed).is_err());
        assert!(authorize(&order(Delivered), &admin, Cancelled).is_err());
    }

    #[test]
    fn test_buyer_cannot_confirm_own_order() {
        let o = order(Pending);
        let err = authorize(&o, &user(10, Role::Buyer), Confirmed).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
