//! Single cached query result
//!
//! A slot holds the latest result of one query together with when it was
//! fetched. The state mutex doubles as the in-flight guard: the first
//! observer of an empty or stale slot fetches while holding the lock, and
//! any concurrent observer parks on the same lock and reads the fresh
//! value instead of issuing a duplicate query.

use crate::error::{AccessResult, CachePatchError};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

enum SlotState<T> {
    Empty,
    Ready { value: T, fetched_at: Instant },
}

pub struct QuerySlot<T> {
    state: Mutex<SlotState<T>>,
}

impl<T: Clone> QuerySlot<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
        }
    }

    /// Return the cached value if it is younger than `staleness`, otherwise
    /// run `fetch` and cache its result. Fetch errors leave the previous
    /// state in place, so a stale value survives a failed refresh.
    pub async fn get_or_fetch<F, Fut>(&self, staleness: Duration, fetch: F) -> AccessResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AccessResult<T>>,
    {
        let mut state = self.state.lock().await;
        if let SlotState::Ready { value, fetched_at } = &*state {
            if fetched_at.elapsed() < staleness {
                return Ok(value.clone());
            }
        }
        let value = fetch().await?;
        *state = SlotState::Ready {
            value: value.clone(),
            fetched_at: Instant::now(),
        };
        Ok(value)
    }

    /// Drop the cached value; the next observation refetches.
    pub async fn invalidate(&self) {
        *self.state.lock().await = SlotState::Empty;
    }

    /// Store a known-fresh value directly.
    pub async fn put(&self, value: T) {
        *self.state.lock().await = SlotState::Ready {
            value,
            fetched_at: Instant::now(),
        };
    }

    /// Current cached value, if any, without fetching or checking age.
    pub async fn peek(&self) -> Option<T> {
        match &*self.state.lock().await {
            SlotState::Ready { value, .. } => Some(value.clone()),
            SlotState::Empty => None,
        }
    }

    /// Apply an in-place patch to the cached value. A missing value is not
    /// an error (there is nothing to patch); a failed patch empties the
    /// slot so the next read refetches instead of serving a half-applied
    /// value.
    pub async fn patch<F>(&self, patch: F) -> Result<(), CachePatchError>
    where
        F: FnOnce(&mut T) -> Result<(), CachePatchError>,
    {
        let mut state = self.state.lock().await;
        if let SlotState::Ready { value, .. } = &mut *state {
            if let Err(e) = patch(value) {
                *state = SlotState::Empty;
                return Err(e);
            }
        }
        Ok(())
    }
}

impl<T: Clone> Default for QuerySlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccessError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn caches_within_staleness_window() {
        let slot = QuerySlot::new();
        let calls = AtomicU32::new(0);
        for _ in 0..3 {
            let value = slot
                .get_or_fetch(Duration::from_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_staleness_always_refetches() {
        let slot = QuerySlot::new();
        let calls = AtomicU32::new(0);
        for _ in 0..2 {
            slot.get_or_fetch(Duration::ZERO, || async {
                Ok(calls.fetch_add(1, Ordering::SeqCst))
            })
            .await
            .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_value() {
        let slot = QuerySlot::new();
        slot.put(7).await;

        let result: AccessResult<i32> = slot
            .get_or_fetch(Duration::ZERO, || async {
                Err(AccessError::Store(medserve_store::StoreError::Backend(
                    "down".into(),
                )))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(slot.peek().await, Some(7));
    }

    #[tokio::test]
    async fn concurrent_observers_share_one_fetch() {
        use std::sync::Arc;

        let slot = Arc::new(QuerySlot::new());
        let calls = Arc::new(AtomicU32::new(0));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let slot = Arc::clone(&slot);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    slot.get_or_fetch(Duration::from_secs(60), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok(1)
                    })
                    .await
                    .unwrap()
                })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_patch_empties_slot() {
        let slot = QuerySlot::new();
        slot.put(vec![1, 2, 3]).await;
        let result = slot
            .patch(|_| Err(CachePatchError("bad patch".into())))
            .await;
        assert!(result.is_err());
        assert_eq!(slot.peek().await, None);
    }
}
