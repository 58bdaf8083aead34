//! Stock Ledger
//!
//! Serializes concurrent stock mutation through optimistic versioning: read
//! stock+version, verify availability, write conditioned on the version
//! being unchanged. A lost race becomes a retry, never a silent oversell.

use crate::db::repository::product;
use crate::stock::retry::with_retry;
use shared::error::{AppError, AppResult};
use sqlx::SqlitePool;

/// The sole mutator of product stock
#[derive(Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Decrement stock for a sale.
    ///
    /// Fails `OutOfStock` (carrying the observed availability) when the
    /// product cannot cover `amount`, `Conflict` after retry exhaustion.
    pub async fn decrement(&self, product_id: i64, amount: i64) -> AppResult<()> {
        if amount <= 0 {
            return Err(AppError::invalid(format!(
                "decrement amount must be positive, got {amount}"
            )));
        }
        with_retry("stock.decrement", || {
            Self::try_decrement(self.pool.clone(), product_id, amount)
        })
        .await
    }

    /// Restore stock (cancellation, or compensation of a failed group)
    pub async fn restore(&self, product_id: i64, amount: i64) -> AppResult<()> {
        if amount <= 0 {
            return Err(AppError::invalid(format!(
                "restore amount must be positive, got {amount}"
            )));
        }
        with_retry("stock.restore", || {
            Self::try_restore(self.pool.clone(), product_id, amount)
        })
        .await
    }

    async fn try_decrement(pool: SqlitePool, product_id: i64, amount: i64) -> AppResult<()> {
        let (stock, version) = product::read_stock(&pool, product_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Product {product_id}")))?;

        if amount > stock {
            return Err(AppError::out_of_stock(product_id, stock));
        }

        let updated = product::try_set_stock(&pool, product_id, stock - amount, version)
            .await
            .map_err(AppError::from)?;
        if !updated {
            return Err(AppError::conflict(format!(
                "Stock version changed for product {product_id}"
            )));
        }

        tracing::debug!(product_id, amount, remaining = stock - amount, "Stock decremented");
        Ok(())
    }

    async fn try_restore(pool: SqlitePool, product_id: i64, amount: i64) -> AppResult<()> {
        let (stock, version) = product::read_stock(&pool, product_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found(format!("Product {product_id}")))?;

        let updated = product::try_set_stock(&pool, product_id, stock + amount, version)
            .await
            .map_err(AppError::from)?;
        if !updated {
            return Err(AppError::conflict(format!(
                "Stock version changed for product {product_id}"
            )));
        }

        tracing::debug!(product_id, amount, remaining = stock + amount, "Stock restored");
        Ok(())
    }
}
