//! Address Repository

use super::RepoResult;
use shared::models::Address;
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const ADDRESS_SELECT: &str =
    "SELECT id, user_id, recipient, phone, line, region, is_active, created_at FROM address";

/// Find an active address by id; deactivated rows are invisible
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Address>> {
    let sql = format!("{ADDRESS_SELECT} WHERE id = ? AND is_active = 1");
    let row = sqlx::query_as::<_, Address>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Create an address
pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    recipient: &str,
    phone: &str,
    line: &str,
    region: &str,
) -> RepoResult<Address> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO address (id, user_id, recipient, phone, line, region, is_active, created_at) VALUES (?, ?, ?, ?, ?, ?, 1, ?)",
    )
    .bind(id)
    .bind(user_id)
    .bind(recipient)
    .bind(phone)
    .bind(line)
    .bind(region)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| super::RepoError::Database("Failed to create address".into()))
}

/// Soft-delete an address
pub async fn deactivate(pool: &SqlitePool, user_id: i64, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE address SET is_active = 0 WHERE id = ? AND user_id = ? AND is_active = 1")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn test_deactivated_address_is_invisible() {
        let db = DbService::new_in_memory().await.unwrap();
        let addr = create(&db.pool, 1, "Ana", "555-0101", "12 Orchard Way", "north")
            .await
            .unwrap();

        assert!(find_by_id(&db.pool, addr.id).await.unwrap().is_some());
        assert!(deactivate(&db.pool, 1, addr.id).await.unwrap());
        assert!(find_by_id(&db.pool, addr.id).await.unwrap().is_none());
    }
}
