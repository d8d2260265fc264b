//! Bounded retry for read queries

use crate::error::{AccessError, AccessResult};
use std::future::Future;

/// Run a read operation, retrying transient failures up to `retries`
/// additional times. Not-found and validation errors return immediately.
pub async fn with_retries<T, F, Fut>(retries: u32, mut op: F) -> AccessResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AccessResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() || attempt >= retries => return Err(err),
            Err(err) => {
                attempt += 1;
                tracing::warn!(attempt, error = %err, "read failed, retrying");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medserve_store::StoreError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = with_retries(2, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AccessError::Store(StoreError::Backend("flaky".into())))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_retry_budget() {
        let calls = AtomicU32::new(0);
        let result: AccessResult<()> = with_retries(1, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AccessError::Store(StoreError::Backend("down".into())))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: AccessResult<()> = with_retries(3, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AccessError::NotFound("service".into()))
        })
        .await;
        assert!(matches!(result, Err(AccessError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
