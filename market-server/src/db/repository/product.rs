//! Product Repository
//!
//! Catalog reads plus the stock compare-and-swap. Deleted products are
//! filtered out of every find method; stock writes go through
//! [`try_set_stock`] only (callers: the stock ledger).

use super::RepoResult;
use shared::models::{PriceTier, Product, ProductCreate, ProductStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const PRODUCT_SELECT: &str = "SELECT id, seller_id, name, status, unit, region, retail_price, wholesale_enabled, wholesale_base_price, wholesale_unit, stock_quantity, version, created_at, updated_at FROM product";

/// Find a live product by id (deleted rows are invisible)
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ? AND status != 'DELETED'");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Wholesale tiers for a product, lowest threshold first
pub async fn find_tiers(pool: &SqlitePool, product_id: i64) -> RepoResult<Vec<PriceTier>> {
    let rows = sqlx::query_as::<_, PriceTier>(
        "SELECT id, product_id, min_quantity, unit_price FROM price_tier WHERE product_id = ? ORDER BY min_quantity ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Read the current stock and version for a live product
pub async fn read_stock(pool: &SqlitePool, id: i64) -> RepoResult<Option<(i64, i64)>> {
    let row = sqlx::query_as::<_, (i64, i64)>(
        "SELECT stock_quantity, version FROM product WHERE id = ? AND status != 'DELETED'",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Conditionally write stock: succeeds only when `version` is unchanged.
///
/// Returns false when another writer got there first.
pub async fn try_set_stock(
    pool: &SqlitePool,
    id: i64,
    new_stock: i64,
    expected_version: i64,
) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE product SET stock_quantity = ?, version = version + 1, updated_at = ? WHERE id = ? AND version = ?",
    )
    .bind(new_stock)
    .bind(now)
    .bind(id)
    .bind(expected_version)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Create a product with its wholesale tiers (catalog seeding)
pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO product (id, seller_id, name, status, unit, region, retail_price, wholesale_enabled, wholesale_base_price, wholesale_unit, stock_quantity, version, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
    )
    .bind(id)
    .bind(data.seller_id)
    .bind(&data.name)
    .bind(ProductStatus::Active)
    .bind(&data.unit)
    .bind(&data.region)
    .bind(data.retail_price)
    .bind(data.wholesale_enabled)
    .bind(data.wholesale_base_price)
    .bind(&data.wholesale_unit)
    .bind(data.stock_quantity)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    for tier in &data.tiers {
        sqlx::query(
            "INSERT INTO price_tier (id, product_id, min_quantity, unit_price) VALUES (?, ?, ?, ?)",
        )
        .bind(snowflake_id())
        .bind(id)
        .bind(tier.min_quantity)
        .bind(tier.unit_price)
        .execute(pool)
        .await?;
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| super::RepoError::Database("Failed to create product".into()))
}

/// Soft-delete a product; subsequent finds behave as if it never existed
pub async fn mark_deleted(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query("UPDATE product SET status = 'DELETED', updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Update sellable status (catalog-side toggling)
pub async fn set_status(pool: &SqlitePool, id: i64, status: ProductStatus) -> RepoResult<bool> {
    let now = now_millis();
    let rows = sqlx::query("UPDATE product SET status = ?, updated_at = ? WHERE id = ? AND status != 'DELETED'")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
