//! Bounded retry for optimistic-version conflicts
//!
//! Wraps a read-verify-write operation and re-runs it on `Conflict` up to a
//! fixed attempt count with a small fixed backoff. Any other outcome —
//! success or a different error — passes through untouched, so the wrapped
//! operation must be idempotent only with respect to its own failed
//! attempts.

use shared::error::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;

/// Attempts before a conflict surfaces to the caller
pub const MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts
pub const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Run `op` until it succeeds, fails with a non-conflict error, or exhausts
/// the attempt budget.
pub async fn with_retry<T, F, Fut>(op_name: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Err(AppError::Conflict(msg)) if attempt < MAX_ATTEMPTS => {
                tracing::debug!(op = op_name, attempt, error = %msg, "Optimistic conflict, retrying");
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
            other => {
                if attempt > 1 && other.is_ok() {
                    tracing::debug!(op = op_name, attempt, "Retry succeeded");
                }
                return other;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_success_passes_through_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = with_retry("test", move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AppError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_conflict_retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = with_retry("test", move || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AppError::conflict("version changed"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_conflict_exhausts_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: AppResult<()> = with_retry("test", move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(AppError::conflict("version changed"))
            }
        })
        .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_non_conflict_errors_do_not_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: AppResult<()> = with_retry("test", move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(AppError::out_of_stock(1, 0))
            }
        })
        .await;
        assert!(matches!(result, Err(AppError::OutOfStock { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
