//! Payment Repository
//!
//! Terminal payments are immutable: the mark_* writes are conditional on
//! `status = 'PENDING'`, which is the idempotency gate for redelivered
//! gateway callbacks.

use super::RepoResult;
use shared::models::{Payment, PaymentState};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const PAYMENT_SELECT: &str = "SELECT id, order_id, amount, gateway, transaction_code, status, payment_time, gateway_message, created_at FROM payment";

/// Insert a payment row
pub async fn create(pool: &SqlitePool, payment: &Payment) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO payment (id, order_id, amount, gateway, transaction_code, status, payment_time, gateway_message, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(payment.id)
    .bind(payment.order_id)
    .bind(payment.amount)
    .bind(&payment.gateway)
    .bind(&payment.transaction_code)
    .bind(payment.status)
    .bind(payment.payment_time)
    .bind(&payment.gateway_message)
    .bind(payment.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Build and insert a new PENDING payment for an order
pub async fn create_pending(
    pool: &SqlitePool,
    order_id: i64,
    amount: f64,
    gateway: &str,
) -> RepoResult<Payment> {
    let payment = Payment {
        id: snowflake_id(),
        order_id,
        amount,
        gateway: gateway.to_string(),
        transaction_code: None,
        status: PaymentState::Pending,
        payment_time: None,
        gateway_message: None,
        created_at: now_millis(),
    };
    create(pool, &payment).await?;
    Ok(payment)
}

/// Find by id
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Payment>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Find by the gateway's external transaction code
pub async fn find_by_transaction_code(
    pool: &SqlitePool,
    transaction_code: &str,
) -> RepoResult<Option<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE transaction_code = ?");
    let row = sqlx::query_as::<_, Payment>(&sql)
        .bind(transaction_code)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Oldest still-PENDING payment of an order, if any
pub async fn find_pending_by_order(
    pool: &SqlitePool,
    order_id: i64,
) -> RepoResult<Option<Payment>> {
    let sql = format!(
        "{PAYMENT_SELECT} WHERE order_id = ? AND status = 'PENDING' ORDER BY created_at ASC, id ASC"
    );
    let row = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// All payments of an order, oldest first
pub async fn list_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE order_id = ? ORDER BY created_at ASC, id ASC");
    let rows = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Resolve a PENDING payment to SUCCESS.
///
/// Returns false if the payment was already terminal (duplicate delivery).
pub async fn mark_success(
    pool: &SqlitePool,
    id: i64,
    transaction_code: &str,
    payment_time: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE payment SET status = 'SUCCESS', transaction_code = ?, payment_time = ? WHERE id = ? AND status = 'PENDING'",
    )
    .bind(transaction_code)
    .bind(payment_time)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Resolve a PENDING payment to FAILED.
///
/// Returns false if the payment was already terminal (duplicate delivery).
pub async fn mark_failed(
    pool: &SqlitePool,
    id: i64,
    transaction_code: Option<&str>,
    message: Option<&str>,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE payment SET status = 'FAILED', transaction_code = COALESCE(?, transaction_code), gateway_message = ? WHERE id = ? AND status = 'PENDING'",
    )
    .bind(transaction_code)
    .bind(message)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::{Order, OrderClass, OrderStatus, PaymentMethod, PaymentStatus};

    async fn seed_order(pool: &SqlitePool, code: &str) -> Order {
        let now = now_millis();
        let order = Order {
            id: snowflake_id(),
            code: code.to_string(),
            buyer_id: 1,
            seller_id: 2,
            order_class: OrderClass::Retail,
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::Gateway,
            payment_status: PaymentStatus::Pending,
            subtotal: 10.0,
            shipping_fee: 0.0,
            discount: 0.0,
            total_amount: 10.0,
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
            amount: 10.0,
            gateway: "sandbox".into(),
            transaction_code: None,
            status: PaymentState::Pending,
            payment_time: None,
            gateway_message: None,
            created_at: now,
        };
        super::super::order::create_with_lines(pool, &order, &[], &payment)
            .await
            .unwrap();
        order
    }

    #[tokio::test]
    async fn test_mark_success_only_once() {
        let db = DbService::new_in_memory().await.unwrap();
        let order = seed_order(&db.pool, "ORD250101-0100").await;
        let pending = find_pending_by_order(&db.pool, order.id)
            .await
            .unwrap()
            .unwrap();

        assert!(mark_success(&db.pool, pending.id, "TXN-1", 123).await.unwrap());
        // Second delivery hits a terminal payment and is a no-op
        assert!(!mark_success(&db.pool, pending.id, "TXN-1", 456).await.unwrap());

        let resolved = find_by_transaction_code(&db.pool, "TXN-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.status, PaymentState::Success);
        assert_eq!(resolved.payment_time, Some(123));
    }

    #[tokio::test]
    async fn test_mark_failed_keeps_message() {
        let db = DbService::new_in_memory().await.unwrap();
        let order = seed_order(&db.pool, "ORD250101-0101").await;
        let pending = find_pending_by_order(&db.pool, order.id)
            .await
            .unwrap()
            .unwrap();

        assert!(
            mark_failed(&db.pool, pending.id, Some("TXN-2"), Some("card declined"))
                .await
                .unwrap()
        );
        let resolved = find_by_id(&db.pool, pending.id).await.unwrap().unwrap();
        assert_eq!(resolved.status, PaymentState::Failed);
        assert_eq!(resolved.gateway_message.as_deref(), Some("card declined"));
        // No pending payment left on the order
        assert!(
            find_pending_by_order(&db.pool, order.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
