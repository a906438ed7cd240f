//! Bounded retry with backoff for transient store failures.
//!
//! Settlement operations run inside a single store transaction; when the
//! store connection hiccups (closed connection, pool exhaustion, `SQLite`
//! write lock) the whole operation is re-run from a fresh transaction, so no
//! partial state ever leaks between attempts. Non-transient errors are
//! surfaced immediately.

use crate::errors::{Error, Result};
use sea_orm::DbErr;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Total attempts before a transient failure is surfaced to the caller.
pub const MAX_STORE_ATTEMPTS: u32 = 3;

/// Delay between attempts.
pub const STORE_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Whether a store error is connectivity-class and worth retrying.
fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => true,
        other => {
            let message = other.to_string().to_lowercase();
            message.contains("database is locked")
                || message.contains("connection")
                || message.contains("ssl")
        }
    }
}

/// Runs `op` up to [`MAX_STORE_ATTEMPTS`] times, sleeping
/// [`STORE_RETRY_BACKOFF`] between attempts that failed with a transient
/// store error. Every other outcome - success or a non-transient error - is
/// returned as-is from the attempt that produced it.
pub async fn with_store_retry<T, F, Fut>(operation: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(Error::Database(err)) if attempt < MAX_STORE_ATTEMPTS && is_transient(&err) => {
                warn!(operation, attempt, error = %err, "transient store error, retrying");
                attempt += 1;
                tokio::time::sleep(STORE_RETRY_BACKOFF).await;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use sea_orm::RuntimeErr;
    use std::cell::Cell;

    fn transient_err() -> Error {
        Error::Database(DbErr::Conn(RuntimeErr::Internal(
            "connection closed".to_string(),
        )))
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = Cell::new(0);
        let result: Result<i32> = with_store_retry("test_op", || {
            calls.set(calls.get() + 1);
            let attempt = calls.get();
            async move {
                if attempt < 3 {
                    Err(transient_err())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<i32> = with_store_retry("test_op", || {
            calls.set(calls.get() + 1);
            async { Err(transient_err()) }
        })
        .await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(calls.get(), MAX_STORE_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_does_not_retry_domain_errors() {
        let calls = Cell::new(0);
        let result: Result<i32> = with_store_retry("test_op", || {
            calls.set(calls.get() + 1);
            async {
                Err(Error::InsufficientFunds {
                    required: 1,
                    available: 0,
                })
            }
        })
        .await;

        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&DbErr::Conn(RuntimeErr::Internal(
            "broken".to_string()
        ))));
        assert!(is_transient(&DbErr::Custom(
            "database is locked".to_string()
        )));
        assert!(!is_transient(&DbErr::Custom(
            "UNIQUE constraint failed".to_string()
        )));
    }
}
