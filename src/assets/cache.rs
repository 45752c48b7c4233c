//! Per-process memoization of asset loads.
//!
//! Each slot stores the shared in-flight future itself, not just its output,
//! so concurrent callers asking for the same key await one computation.
//! Entries are written once and never evicted.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

type Slot<T> = Shared<BoxFuture<'static, T>>;

/// Memoizing store keyed by `K`, holding results of type `T`.
pub struct AssetCache<K, T>
where
    T: Clone,
{
    slots: Mutex<HashMap<K, Slot<T>>>,
}

impl<K, T> AssetCache<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }

    /// Return the result stored for `key`, running `compute` only if no
    /// caller has asked for this key before.
    pub async fn memoize<F, Fut>(&self, key: K, compute: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots
                .entry(key)
                .or_insert_with(|| compute().boxed().shared())
                .clone()
        };
        slot.await
    }

    /// Whether a computation for `key` has been started.
    pub fn contains(&self, key: &K) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, T> Default for AssetCache<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> fmt::Debug for AssetCache<K, T>
where
    T: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.slots.lock().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("AssetCache").field("entries", &entries).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn compute_runs_once_per_key() {
        let cache: AssetCache<String, u32> = AssetCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let v = cache
                .memoize("a".to_string(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    7
                })
                .await;
            assert_eq!(v, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_compute_separately() {
        let cache: AssetCache<&'static str, usize> = AssetCache::new();
        let a = cache.memoize("a", || async { 1 }).await;
        let b = cache.memoize("b", || async { 2 }).await;
        assert_eq!((a, b), (1, 2));
        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"c"));
    }

    #[tokio::test]
    async fn concurrent_callers_share_in_flight_result() {
        let cache: Arc<AssetCache<String, u64>> = Arc::new(AssetCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let first = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .memoize("slow".to_string(), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        let _ = release_rx.await;
                        42
                    })
                    .await
            })
        };

        // Wait until the first caller has installed its slot.
        while !cache.contains(&"slow".to_string()) {
            tokio::task::yield_now().await;
        }

        let second = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .memoize("slow".to_string(), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        0
                    })
                    .await
            })
        };

        let _ = release_tx.send(());
        assert_eq!(first.await.unwrap(), 42);
        assert_eq!(second.await.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
