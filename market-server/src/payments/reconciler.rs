//! Payment reconciliation
//!
//! Matches an asynchronous gateway callback to a Payment and applies its
//! outcome exactly once. Matching order: transaction code, then order code,
//! then the order's pending Payment (synthesizing one when absent). Only a
//! PENDING payment is ever mutated; callbacks against terminal payments are
//! logged and discarded.

use crate::db::repository::{order as order_repo, payment as payment_repo};
use crate::notify::Notifier;
use crate::payments::gateway::GatewayCallback;
use crate::utils::money;
use shared::error::{AppError, AppResult};
use shared::models::{Order, OrderStatus, Payment, PaymentStatus};
use shared::util::now_millis;
use sqlx::SqlitePool;

/// What a callback delivery did
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The payment was resolved by this delivery
    Applied,
    /// Duplicate/late delivery against a terminal payment; discarded
    Ignored,
}

#[derive(Clone)]
pub struct PaymentReconciler {
    pool: SqlitePool,
    notifier: Notifier,
}

impl PaymentReconciler {
    pub fn new(pool: SqlitePool, notifier: Notifier) -> Self {
        Self { pool, notifier }
    }

    /// Apply one authenticated gateway callback.
    pub async fn handle_callback(
        &self,
        gateway: &str,
        callback: &GatewayCallback,
    ) -> AppResult<ReconcileOutcome> {
        if callback.order_code.trim().is_empty() {
            return Err(AppError::invalid("Callback missing order code"));
        }
        if callback.transaction_code.trim().is_empty() {
            return Err(AppError::invalid("Callback missing transaction code"));
        }
        if let Some(amount) = callback.amount {
            money::validate_price(amount, "callback amount")?;
        }

        let (order, payment) = self.locate(gateway, callback).await?;
        let Some(payment) = payment else {
            // Terminal payment matched by transaction code: duplicate delivery
            return Ok(ReconcileOutcome::Ignored);
        };

        if let Some(amount) = callback.amount
            && !money::money_eq(amount, payment.amount)
        {
            tracing::warn!(
                order_code = %order.code,
                payment_id = payment.id,
                expected = payment.amount,
                reported = amount,
                "Gateway reported a different amount than the payment"
            );
        }

        if callback.success {
            self.apply_success(&order, &payment, callback).await
        } else {
            self.apply_failure(&order, &payment, callback).await
        }
    }

    /// Matching policy. `Ok((order, None))` means a terminal payment
    /// already carries this transaction code.
    async fn locate(
        &self,
        gateway: &str,
        callback: &GatewayCallback,
    ) -> AppResult<(Order, Option<Payment>)> {
        if let Some(existing) =
            payment_repo::find_by_transaction_code(&self.pool, &callback.transaction_code)
                .await
                .map_err(AppError::from)?
        {
            let order = order_repo::find_by_id(&self.pool, existing.order_id)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| {
                    AppError::internal(format!("Payment {} has no order", existing.id))
                })?;
            if existing.status.is_terminal() {
                tracing::info!(
                    order_code = %order.code,
                    transaction_code = %callback.transaction_code,
                    "Duplicate gateway callback against terminal payment, discarding"
                );
                return Ok((order, None));
            }
            return Ok((order, Some(existing)));
        }

        let order = order_repo::find_by_code(&self.pool, &callback.order_code)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::invalid(format!("Unknown order code {}", callback.order_code))
            })?;

        let payment = match payment_repo::find_pending_by_order(&self.pool, order.id)
            .await
            .map_err(AppError::from)?
        {
            Some(pending) => pending,
            None => {
                // Every prior payment is terminal; record this delivery on
                // a fresh pending payment
                let amount = callback.amount.unwrap_or(order.total_amount);
                tracing::info!(
                    order_code = %order.code,
                    amount,
                    "No pending payment for callback, synthesizing one"
                );
                payment_repo::create_pending(&self.pool, order.id, amount, gateway)
                    .await
                    .map_err(AppError::from)?
            }
        };
        Ok((order, Some(payment)))
    }

    async fn apply_success(
        &self,
        order: &Order,
        payment: &Payment,
        callback: &GatewayCallback,
    ) -> AppResult<ReconcileOutcome> {
        let now = now_millis();
        let applied =
            payment_repo::mark_success(&self.pool, payment.id, &callback.transaction_code, now)
                .await
                .map_err(AppError::from)?;
        if !applied {
            tracing::info!(
                order_code = %order.code,
                payment_id = payment.id,
                "Payment resolved concurrently, discarding callback"
            );
            return Ok(ReconcileOutcome::Ignored);
        }

        order_repo::set_payment_status(&self.pool, order.id, PaymentStatus::Paid)
            .await
            .map_err(AppError::from)?;

        // A paid PENDING order advances to CONFIRMED
        if order.status == OrderStatus::Pending {
            let advanced = order_repo::transition_status(
                &self.pool,
                order.id,
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                None,
            )
            .await
            .map_err(AppError::from)?;
            if advanced {
                let updated = order_repo::find_by_id(&self.pool, order.id)
                    .await
                    .map_err(AppError::from)?
                    .ok_or_else(|| AppError::internal(format!("Order {} vanished", order.id)))?;
                self.notifier
                    .notify_status_changed(&updated, OrderStatus::Pending);
            }
        }

        let resolved = payment_repo::find_by_id(&self.pool, payment.id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::internal(format!("Payment {} vanished", payment.id)))?;
        self.notifier.notify_payment_succeeded(order, &resolved);

        tracing::info!(
            order_code = %order.code,
            transaction_code = %callback.transaction_code,
            "Payment succeeded"
        );
        Ok(ReconcileOutcome::Applied)
    }

    async fn apply_failure(
        &self,
        order: &Order,
        payment: &Payment,
        callback: &GatewayCallback,
    ) -> AppResult<ReconcileOutcome> {
        let applied = payment_repo::mark_failed(
            &self.pool,
            payment.id,
            Some(&callback.transaction_code),
            callback.error_message.as_deref(),
        )
        .await
        .map_err(AppError::from)?;
        if !applied {
            tracing::info!(
                order_code = %order.code,
                payment_id = payment.id,
                "Payment resolved concurrently, discarding callback"
            );
            return Ok(ReconcileOutcome::Ignored);
        }

        // The order stays where it is; only the settlement status flips
        order_repo::set_payment_status(&self.pool, order.id, PaymentStatus::Failed)
            .await
            .map_err(AppError::from)?;

        let resolved = payment_repo::find_by_id(&self.pool, payment.id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::internal(format!("Payment {} vanished", payment.id)))?;
        self.notifier.notify_payment_failed(order, &resolved);

        tracing::info!(
            order_code = %order.code,
            transaction_code = %callback.transaction_code,
            message = ?callback.error_message,
            "Payment failed"
        );
        Ok(ReconcileOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::{OrderClass, OrderLine, PaymentMethod, PaymentState};
    use shared::util::snowflake_id;

    fn callback(order_code: &str, txn: &str, success: bool) -> GatewayCallback {
        GatewayCallback {
            order_code: order_code.to_string(),
            transaction_code: txn.to_string(),
            success,
            amount: None,
            error_message: if success {
                None
            } else {
                Some("card declined".to_string())
            },
        }
    }

    async fn seed_order(pool: &SqlitePool, code: &str, status: OrderStatus) -> Order {
        let now = now_millis();
        let order = Order {
            id: snowflake_id(),
            code: code.to_string(),
            buyer_id: 1,
            seller_id: 2,
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
        };
        let payment = Payment {
            id: snowflake_id(),
            order_id: order.id,
            amount: order.total_amount,
            gateway: "sandbox".into(),
            transaction_code: None,
            status: PaymentState::Pending,
            payment_time: None,
            gateway_message: None,
            created_at: now,
        };
        order_repo::create_with_lines(pool, &order, &Vec::<OrderLine>::new(), &payment)
            .await
            .unwrap();
        order
    }

    #[tokio::test]
    async fn test_success_callback_confirms_pending_order() {
        let db = DbService::new_in_memory().await.unwrap();
        let reconciler = PaymentReconciler::new(db.pool.clone(), Notifier::new());
        let order = seed_order(&db.pool, "ORD250101-0001", OrderStatus::Pending).await;

        let outcome = reconciler
            .handle_callback("sandbox", &callback("ORD250101-0001", "TXN-1", true))
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Applied);

        let updated = order_repo::find_by_id(&db.pool, order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Confirmed);
        assert_eq!(updated.payment_status, PaymentStatus::Paid);

        let payment = payment_repo::find_by_transaction_code(&db.pool, "TXN-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentState::Success);
        assert!(payment.payment_time.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_ignored() {
        let db = DbService::new_in_memory().await.unwrap();
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let reconciler = PaymentReconciler::new(db.pool.clone(), notifier);
        let order = seed_order(&db.pool, "ORD250101-0002", OrderStatus::Pending).await;

        let cb = callback("ORD250101-0002", "TXN-2", true);
        assert_eq!(
            reconciler.handle_callback("sandbox", &cb).await.unwrap(),
            ReconcileOutcome::Applied
        );
        assert_eq!(
            reconciler.handle_callback("sandbox", &cb).await.unwrap(),
            ReconcileOutcome::Ignored
        );

        // Exactly one SUCCESS payment and one status change
        let payments = payment_repo::list_by_order(&db.pool, order.id).await.unwrap();
        let successes = payments
            .iter()
            .filter(|p| p.status == PaymentState::Success)
            .count();
        assert_eq!(successes, 1);

        let mut status_changes = 0;
        while let Ok(notification) = rx.try_recv() {
            if matches!(
                notification.event,
                crate::notify::MarketEvent::OrderStatusChanged { .. }
            ) {
                status_changes += 1;
            }
        }
        assert_eq!(status_changes, 1);
    }

    #[tokio::test]
    async fn test_failure_leaves_order_status_untouched() {
        let db = DbService::new_in_memory().await.unwrap();
        let reconciler = PaymentReconciler::new(db.pool.clone(), Notifier::new());
        let order = seed_order(&db.pool, "ORD250101-0003", OrderStatus::Pending).await;

        let outcome = reconciler
            .handle_callback("sandbox", &callback("ORD250101-0003", "TXN-3", false))
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Applied);

        let updated = order_repo::find_by_id(&db.pool, order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Pending);
        assert_eq!(updated.payment_status, PaymentStatus::Failed);

        let payment = payment_repo::find_by_transaction_code(&db.pool, "TXN-3")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentState::Failed);
        assert_eq!(payment.gateway_message.as_deref(), Some("card declined"));
    }

    #[tokio::test]
    async fn test_retry_after_failure_synthesizes_new_payment() {
        let db = DbService::new_in_memory().await.unwrap();
        let reconciler = PaymentReconciler::new(db.pool.clone(), Notifier::new());
        let order = seed_order(&db.pool, "ORD250101-0004", OrderStatus::Pending).await;

        // First attempt fails and consumes the initial pending payment
        reconciler
            .handle_callback("sandbox", &callback("ORD250101-0004", "TXN-4A", false))
            .await
            .unwrap();
        // Buyer retries; a new pending payment is synthesized and succeeds
        let outcome = reconciler
            .handle_callback("sandbox", &callback("ORD250101-0004", "TXN-4B", true))
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Applied);

        let payments = payment_repo::list_by_order(&db.pool, order.id).await.unwrap();
        assert_eq!(payments.len(), 2);
        let updated = order_repo::find_by_id(&db.pool, order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.payment_status, PaymentStatus::Paid);
        assert_eq!(updated.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_unknown_order_code_is_invalid() {
        let db = DbService::new_in_memory().await.unwrap();
        let reconciler = PaymentReconciler::new(db.pool.clone(), Notifier::new());

        let err = reconciler
            .handle_callback("sandbox", &callback("ORD999999-9999", "TXN-5", true))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_success_on_confirmed_order_does_not_reconfirm() {
        let db = DbService::new_in_memory().await.unwrap();
        let reconciler = PaymentReconciler::new(db.pool.clone(), Notifier::new());
        let order = seed_order(&db.pool, "ORD250101-0006", OrderStatus::Confirmed).await;

        let outcome = reconciler
            .handle_callback("sandbox", &callback("ORD250101-0006", "TXN-6", true))
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Applied);

        let updated = order_repo::find_by_id(&db.pool, order.id)
            .await
            .unwrap()
            .unwrap();
        // Already past PENDING; only the settlement status moved
        assert_eq!(updated.status, OrderStatus::Confirmed);
        assert_eq!(updated.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_malformed_payloads_rejected() {
        let db = DbService::new_in_memory().await.unwrap();
        let reconciler = PaymentReconciler::new(db.pool.clone(), Notifier::new());

        let mut cb = callback("", "TXN-7", true);
        assert!(matches!(
            reconciler.handle_callback("sandbox", &cb).await,
            Err(AppError::Invalid(_))
        ));

        cb = callback("ORD250101-0007", "", true);
        assert!(matches!(
            reconciler.handle_callback("sandbox", &cb).await,
            Err(AppError::Invalid(_))
        ));

        cb = callback("ORD250101-0007", "TXN-7", true);
        cb.amount = Some(f64::NAN);
        assert!(matches!(
            reconciler.handle_callback("sandbox", &cb).await,
            Err(AppError::Invalid(_))
        ));
    }
}
