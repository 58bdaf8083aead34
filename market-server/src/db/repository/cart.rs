//! Cart Repository
//!
//! Simple keyed-by-buyer collection. Checkout reads it as a snapshot and
//! removes only the lines it converted into orders.

use super::RepoResult;
use shared::models::CartLine;
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const CART_SELECT: &str =
    "SELECT id, buyer_id, product_id, quantity, created_at FROM cart_line";

/// All lines for one buyer, oldest first
pub async fn list_by_buyer(pool: &SqlitePool, buyer_id: i64) -> RepoResult<Vec<CartLine>> {
    let sql = format!("{CART_SELECT} WHERE buyer_id = ? ORDER BY created_at ASC, id ASC");
    let rows = sqlx::query_as::<_, CartLine>(&sql)
        .bind(buyer_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Add a line, merging quantity into an existing line for the same product
pub async fn add_line(
    pool: &SqlitePool,
    buyer_id: i64,
    product_id: i64,
    quantity: i64,
) -> RepoResult<CartLine> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO cart_line (id, buyer_id, product_id, quantity, created_at) VALUES (?, ?, ?, ?, ?) ON CONFLICT (buyer_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity",
    )
    .bind(id)
    .bind(buyer_id)
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(pool)
    .await?;

    let sql = format!("{CART_SELECT} WHERE buyer_id = ? AND product_id = ?");
    sqlx::query_as::<_, CartLine>(&sql)
        .bind(buyer_id)
        .bind(product_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| super::RepoError::Database("Failed to add cart line".into()))
}

/// Remove one line, scoped to its owner
pub async fn remove_line(pool: &SqlitePool, buyer_id: i64, line_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM cart_line WHERE id = ? AND buyer_id = ?")
        .bind(line_id)
        .bind(buyer_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Remove the consumed lines after a successful checkout
pub async fn remove_lines(pool: &SqlitePool, line_ids: &[i64]) -> RepoResult<u64> {
    let mut removed = 0;
    for id in line_ids {
        let rows = sqlx::query("DELETE FROM cart_line WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        removed += rows.rows_affected();
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn test_add_merges_same_product() {
        let db = DbService::new_in_memory().await.unwrap();
        add_line(&db.pool, 1, 100, 2).await.unwrap();
        let merged = add_line(&db.pool, 1, 100, 3).await.unwrap();
        assert_eq!(merged.quantity, 5);

        let lines = list_by_buyer(&db.pool, 1).await.unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_consumed_lines_only() {
        let db = DbService::new_in_memory().await.unwrap();
        let a = add_line(&db.pool, 1, 100, 2).await.unwrap();
        let _b = add_line(&db.pool, 1, 200, 1).await.unwrap();

        let removed = remove_lines(&db.pool, &[a.id]).await.unwrap();
        assert_eq!(removed, 1);

        let left = list_by_buyer(&db.pool, 1).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].product_id, 200);
    }

    #[tokio::test]
    async fn test_remove_line_checks_owner() {
        let db = DbService::new_in_memory().await.unwrap();
        let line = add_line(&db.pool, 1, 100, 2).await.unwrap();
        assert!(!remove_line(&db.pool, 2, line.id).await.unwrap());
        assert!(remove_line(&db.pool, 1, line.id).await.unwrap());
    }
}
