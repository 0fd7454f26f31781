//! Process-wide icon content cache with in-flight deduplication.
//!
//! The cache is keyed by icon *name*. An entry is either pending (a fetch is
//! in flight) or resolved (sanitized content available); both states are
//! represented by the same shared future, so any number of concurrent
//! requesters for one key await a single underlying fetch. Failed fetches
//! are evicted immediately (there is no negative caching), so the next
//! request for that key starts fresh.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::error::Result;

type SharedFetch = Shared<BoxFuture<'static, Result<String>>>;

/// A cached entry: the deduplicated fetch future plus an identity tag so a
/// failed entry can be evicted without clobbering a replacement that was
/// inserted in the meantime.
#[derive(Clone)]
struct Entry {
    id: u64,
    future: SharedFetch,
}

impl Entry {
    fn new(future: SharedFetch) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self {
            id: COUNTER.fetch_add(1, Ordering::Relaxed),
            future,
        }
    }
}

static GLOBAL_CACHE: OnceLock<IconCache> = OnceLock::new();

/// In-memory cache of sanitized icon content, shared by every widget
/// instance and by the prefetcher.
///
/// Clones share the same underlying map. The lock is only held across
/// synchronous map operations, never across an `.await`, so the
/// check-then-insert in [`get`](Self::get) cannot interleave with another
/// insertion for the same key: the first writer wins and later callers
/// simply await its future.
#[derive(Clone)]
pub struct IconCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl IconCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The process-wide default cache.
    ///
    /// Loaders accept any cache instance; this one exists so independent
    /// widgets share content by default. Tests should construct fresh
    /// caches with [`IconCache::new`] instead.
    pub fn global() -> IconCache {
        GLOBAL_CACHE.get_or_init(IconCache::new).clone()
    }

    /// Get cached content for `key`, or run `fetcher` to produce it.
    ///
    /// If a pending or resolved entry exists, its shared future is awaited
    /// and `fetcher` is not invoked. Otherwise `fetcher` is invoked exactly
    /// once and its future is registered before any suspension point, so N
    /// concurrent callers for the same key perform one underlying fetch and
    /// all observe the same value or the same error.
    ///
    /// On failure the entry is evicted before the error is returned, so
    /// failures are never replayed to later callers.
    pub async fn get<F, Fut>(&self, key: &str, fetcher: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let entry = {
            let mut entries = self.entries.lock();
            match entries.get(key) {
                Some(existing) => existing.clone(),
                None => {
                    let entry = Entry::new(fetcher().boxed().shared());
                    entries.insert(key.to_string(), entry.clone());
                    entry
                }
            }
        };

        let result = entry.future.clone().await;

        if result.is_err() {
            let mut entries = self.entries.lock();
            if entries.get(key).is_some_and(|current| current.id == entry.id) {
                entries.remove(key);
            }
        }

        result
    }

    /// Remove one entry unconditionally, pending or resolved.
    pub fn clear(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    /// Empty the cache.
    pub fn clear_all(&self) {
        self.entries.lock().clear();
    }

    /// Whether an entry (pending or resolved) exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Number of entries, pending and resolved.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for IconCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IconCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconCache")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::IconError;

    fn counting_fetcher(
        counter: Arc<AtomicUsize>,
        result: Result<String>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<String>> {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { result }.boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_gets_invoke_fetcher_exactly_once() {
        let cache = IconCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_fetch = |calls: Arc<AtomicUsize>| {
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    Ok("<svg/>".to_string())
                }
                .boxed()
            }
        };

        let (a, b, c) = tokio::join!(
            cache.get("x", slow_fetch(calls.clone())),
            cache.get("x", slow_fetch(calls.clone())),
            cache.get("x", slow_fetch(calls.clone())),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), "<svg/>");
        assert_eq!(b.unwrap(), "<svg/>");
        assert_eq!(c.unwrap(), "<svg/>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_gets_share_the_same_error() {
        let cache = IconCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let failing_fetch = |calls: Arc<AtomicUsize>| {
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    Err(IconError::network("offline"))
                }
                .boxed()
            }
        };

        let (a, b) = tokio::join!(
            cache.get("x", failing_fetch(calls.clone())),
            cache.get("x", failing_fetch(calls.clone())),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(a, Err(IconError::Network(_))));
        assert!(matches!(b, Err(IconError::Network(_))));
    }

    #[tokio::test]
    async fn test_no_negative_caching() {
        let cache = IconCache::new();

        let failed = cache
            .get(
                "x",
                counting_fetcher(Arc::new(AtomicUsize::new(0)), Err(IconError::network("boom"))),
            )
            .await;
        assert!(failed.is_err());
        assert!(!cache.contains("x"));

        // The very next get must invoke its fetcher, not replay the failure.
        let second_calls = Arc::new(AtomicUsize::new(0));
        let recovered = cache
            .get(
                "x",
                counting_fetcher(second_calls.clone(), Ok("<svg/>".to_string())),
            )
            .await;

        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(recovered.unwrap(), "<svg/>");
    }

    #[tokio::test]
    async fn test_resolved_entries_are_returned_without_refetch() {
        let cache = IconCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let content = cache
                .get("x", counting_fetcher(calls.clone(), Ok("<svg/>".to_string())))
                .await
                .unwrap();
            assert_eq!(content, "<svg/>");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_are_case_sensitive() {
        let cache = IconCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get("React", counting_fetcher(calls.clone(), Ok("a".to_string())))
            .await
            .unwrap();
        cache
            .get("react", counting_fetcher(calls.clone(), Ok("b".to_string())))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_and_clear_all() {
        let cache = IconCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get("a", counting_fetcher(calls.clone(), Ok("a".to_string())))
            .await
            .unwrap();
        cache
            .get("b", counting_fetcher(calls.clone(), Ok("b".to_string())))
            .await
            .unwrap();

        cache.clear("a");
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));

        cache.clear_all();
        assert!(cache.is_empty());
    }
}
