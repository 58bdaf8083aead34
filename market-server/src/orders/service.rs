//! Order service
//!
//! Applies authorized status transitions and their side effects. The status
//! write is conditional on the previous status, so exactly one of several
//! racing requests wins and runs the effects.

use crate::auth::CurrentUser;
use crate::db::repository::{order as order_repo, payment as payment_repo};
use crate::notify::Notifier;
use crate::orders::transitions;
use crate::stock::StockLedger;
use shared::error::{AppError, AppResult};
use shared::models::{
    Order, OrderDetail, OrderStatus, Payment, PaymentMethod, PaymentState, PaymentStatus, Role,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
    ledger: StockLedger,
    notifier: Notifier,
}

impl OrderService {
    pub fn new(pool: SqlitePool, notifier: Notifier) -> Self {
        let ledger = StockLedger::new(pool.clone());
        Self {
            pool,
            ledger,
            notifier,
        }
    }

    /// Move an order to `to`, enforcing the transition table and running
    /// the attached side effects. Returns the updated order.
    pub async fn update_status(
        &self,
        user: &CurrentUser,
        order_id: i64,
        to: OrderStatus,
    ) -> AppResult<Order> {
        let order = order_repo::find_by_id(&self.pool, order_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

        transitions::authorize(&order, user, to)?;
        let previous = order.status;

        let payment_resolution = self.payment_resolution(&order, to);

        let moved =
            order_repo::transition_status(&self.pool, order_id, previous, to, payment_resolution)
                .await
                .map_err(AppError::from)?;
        if !moved {
            // Lost a concurrent race; whoever won already ran the effects
            return Err(AppError::conflict(format!(
                "Order {} status changed concurrently",
                order.code
            )));
        }

        match to {
            OrderStatus::Delivered => {
                if payment_resolution == Some(PaymentStatus::Paid) {
                    self.record_cash_payment(&order).await?;
                }
            }
            OrderStatus::Cancelled => {
                self.restore_order_stock(&order).await;
                if order.payment_status == PaymentStatus::Paid {
                    tracing::warn!(
                        order_code = %order.code,
                        "Cancelled a paid order; refund requires manual follow-up"
                    );
                }
            }
            OrderStatus::Returned => {
                if order.payment_status == PaymentStatus::Paid {
                    tracing::warn!(
                        order_code = %order.code,
                        "Order returned; refund requires manual follow-up"
                    );
                }
            }
            _ => {}
        }

        let updated = order_repo::find_by_id(&self.pool, order_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::internal(format!("Order {order_id} vanished")))?;

        self.notifier.notify_status_changed(&updated, previous);
        if to == OrderStatus::Cancelled {
            self.notifier.notify_cancelled(&updated);
        }

        tracing::info!(
            order_code = %updated.code,
            from = %previous,
            to = %to,
            actor = user.id,
            "Order status updated"
        );
        Ok(updated)
    }

    /// Cancel shorthand used by the buyer-facing endpoint
    pub async fn cancel(&self, user: &CurrentUser, order_id: i64) -> AppResult<Order> {
        self.update_status(user, order_id, OrderStatus::Cancelled)
            .await
    }

    /// Settlement status to write together with the transition, if any
    fn payment_resolution(&self, order: &Order, to: OrderStatus) -> Option<PaymentStatus> {
        match to {
            OrderStatus::Delivered
                if order.payment_method == PaymentMethod::CashOnDelivery
                    && order.payment_status == PaymentStatus::Pending =>
            {
                Some(PaymentStatus::Paid)
            }
            OrderStatus::Cancelled => Some(match order.payment_status {
                PaymentStatus::Paid | PaymentStatus::Refunded => PaymentStatus::Refunded,
                PaymentStatus::Pending | PaymentStatus::AwaitingTerm | PaymentStatus::Failed => {
                    PaymentStatus::Failed
                }
            }),
            OrderStatus::Returned if order.payment_status == PaymentStatus::Paid => {
                Some(PaymentStatus::Refunded)
            }
            _ => None,
        }
    }

    /// Resolve the pending cash payment on delivery, or record a completed
    /// one when none is pending.
    async fn record_cash_payment(&self, order: &Order) -> AppResult<()> {
        let now = now_millis();
        let reference = format!("CASH-{}", order.code);

        let payment = match payment_repo::find_pending_by_order(&self.pool, order.id)
            .await
            .map_err(AppError::from)?
        {
            Some(pending) => {
                let applied = payment_repo::mark_success(&self.pool, pending.id, &reference, now)
                    .await
                    .map_err(AppError::from)?;
                if !applied {
                    tracing::warn!(
                        order_code = %order.code,
                        payment_id = pending.id,
                        "Pending cash payment resolved concurrently"
                    );
                    return Ok(());
                }
                payment_repo::find_by_id(&self.pool, pending.id)
                    .await
                    .map_err(AppError::from)?
                    .ok_or_else(|| AppError::internal("Cash payment vanished".to_string()))?
            }
            None => {
                let payment = Payment {
                    id: snowflake_id(),
                    order_id: order.id,
                    amount: order.total_amount,
                    gateway: "cash".to_string(),
                    transaction_code: Some(reference),
                    status: PaymentState::Success,
                    payment_time: Some(now),
                    gateway_message: None,
                    created_at: now,
                };
                payment_repo::create(&self.pool, &payment)
                    .await
                    .map_err(AppError::from)?;
                payment
            }
        };

        self.notifier.notify_payment_succeeded(order, &payment);
        Ok(())
    }

    /// Return every line's stock to the shelf. The cancellation is already
    /// committed; a failed restore is logged for manual reconciliation.
    async fn restore_order_stock(&self, order: &Order) {
        let lines = match order_repo::find_lines(&self.pool, order.id).await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::error!(order_code = %order.code, error = %e, "Failed to load lines for stock restore");
                return;
            }
        };
        for line in &lines {
            if let Err(e) = self.ledger.restore(line.product_id, line.quantity).await {
                tracing::error!(
                    order_code = %order.code,
                    product_id = line.product_id,
                    quantity = line.quantity,
                    error = %e,
                    "Stock restore failed"
                );
            }
        }
    }

    /// Full order view, visible to its buyer, its seller and admins
    pub async fn get_detail(&self, user: &CurrentUser, order_id: i64) -> AppResult<OrderDetail> {
        let order = order_repo::find_by_id(&self.pool, order_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

        if !(user.is_admin() || order.is_buyer(user.id) || order.is_seller(user.id)) {
            return Err(AppError::forbidden(format!(
                "Order {} belongs to another user",
                order.code
            )));
        }

        self.load_detail(order).await
    }

    /// Assemble the detail view for an already-authorized order
    pub async fn load_detail(&self, order: Order) -> AppResult<OrderDetail> {
        let lines = order_repo::find_lines(&self.pool, order.id)
            .await
            .map_err(AppError::from)?;
        let payments = payment_repo::list_by_order(&self.pool, order.id)
            .await
            .map_err(AppError::from)?;
        Ok(OrderDetail {
            order,
            lines,
            payments,
        })
    }

    /// Role-aware listing: buyers see purchases, sellers see sales, admins
    /// see everything.
    pub async fn list(
        &self,
        user: &CurrentUser,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Order>> {
        let orders = match user.role {
            Role::Buyer => order_repo::list_by_buyer(&self.pool, user.id, limit, offset).await,
            Role::Seller => order_repo::list_by_seller(&self.pool, user.id, limit, offset).await,
            Role::Admin => order_repo::list_all(&self.pool, limit, offset).await,
        };
        orders.map_err(AppError::from)
    }
}
