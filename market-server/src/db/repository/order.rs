//! Order Repository
//!
//! Orders are never physically deleted. Status writes are conditional on
//! the expected current status, so concurrent transitions on the same order
//! resolve to exactly one winner.

use super::{RepoError, RepoResult};
use shared::models::{Order, OrderLine, OrderStatus, Payment, PaymentStatus};
use shared::util::now_millis;
use sqlx::SqlitePool;

const ORDER_SELECT: &str = "SELECT id, code, buyer_id, seller_id, order_class, status, payment_method, payment_status, subtotal, shipping_fee, discount, total_amount, ship_to_name, ship_to_phone, ship_to_line, ship_to_region, notes, purchase_order_number, created_at, updated_at FROM orders";

/// Persist an order with its lines and initial payment in one transaction
pub async fn create_with_lines(
    pool: &SqlitePool,
    order: &Order,
    lines: &[OrderLine],
    payment: &Payment,
) -> RepoResult<()> {
    let mut txn = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (id, code, buyer_id, seller_id, order_class, status, payment_method, payment_status, subtotal, shipping_fee, discount, total_amount, ship_to_name, ship_to_phone, ship_to_line, ship_to_region, notes, purchase_order_number, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order.id)
    .bind(&order.code)
    .bind(order.buyer_id)
    .bind(order.seller_id)
    .bind(order.order_class)
    .bind(order.status)
    .bind(order.payment_method)
    .bind(order.payment_status)
    .bind(order.subtotal)
    .bind(order.shipping_fee)
    .bind(order.discount)
    .bind(order.total_amount)
    .bind(&order.ship_to_name)
    .bind(&order.ship_to_phone)
    .bind(&order.ship_to_line)
    .bind(&order.ship_to_region)
    .bind(&order.notes)
    .bind(&order.purchase_order_number)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *txn)
    .await?;

    for line in lines {
        sqlx::query(
            "INSERT INTO order_line (id, order_id, product_id, product_name, unit, unit_price, quantity, line_total) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(line.id)
        .bind(line.order_id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(&line.unit)
        .bind(line.unit_price)
        .bind(line.quantity)
        .bind(line.line_total)
        .execute(&mut *txn)
        .await?;
    }

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
    .execute(&mut *txn)
    .await?;

    txn.commit().await?;
    Ok(())
}

/// Find an order by id
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Find an order by its buyer-facing code
pub async fn find_by_code(pool: &SqlitePool, code: &str) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE code = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Whether a candidate order code is already taken
pub async fn code_exists(pool: &SqlitePool, code: &str) -> RepoResult<bool> {
    let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM orders WHERE code = ?")
        .bind(code)
        .fetch_one(pool)
        .await?;
    Ok(row.0 > 0)
}

/// A buyer's orders, newest first
pub async fn list_by_buyer(
    pool: &SqlitePool,
    buyer_id: i64,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE buyer_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(buyer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// A seller's orders, newest first
pub async fn list_by_seller(
    pool: &SqlitePool,
    seller_id: i64,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE seller_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(seller_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// All orders, newest first (admin view)
pub async fn list_all(pool: &SqlitePool, limit: i64, offset: i64) -> RepoResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Lines of one order, stable order
pub async fn find_lines(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderLine>> {
    let rows = sqlx::query_as::<_, OrderLine>(
        "SELECT id, order_id, product_id, product_name, unit, unit_price, quantity, line_total FROM order_line WHERE order_id = ? ORDER BY id ASC",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Conditionally move an order `from -> to`, optionally resolving its
/// payment status in the same statement.
///
/// Returns false when the order was not in `from` anymore — the caller
/// lost a concurrent race and must not apply side effects.
pub async fn transition_status(
    pool: &SqlitePool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
    payment_status: Option<PaymentStatus>,
) -> RepoResult<bool> {
    let now = now_millis();
    let rows = match payment_status {
        Some(ps) => {
            sqlx::query(
                "UPDATE orders SET status = ?, payment_status = ?, updated_at = ? WHERE id = ? AND status = ?",
            )
            .bind(to)
            .bind(ps)
            .bind(now)
            .bind(id)
            .bind(from)
            .execute(pool)
            .await?
        }
        None => {
            sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
                .bind(to)
                .bind(now)
                .bind(id)
                .bind(from)
                .execute(pool)
                .await?
        }
    };
    Ok(rows.rows_affected() > 0)
}

/// Update only the settlement status (payment reconciliation path)
pub async fn set_payment_status(
    pool: &SqlitePool,
    id: i64,
    payment_status: PaymentStatus,
) -> RepoResult<()> {
    let now = now_millis();
    let rows = sqlx::query("UPDATE orders SET payment_status = ?, updated_at = ? WHERE id = ?")
        .bind(payment_status)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }
    Ok(())
}
