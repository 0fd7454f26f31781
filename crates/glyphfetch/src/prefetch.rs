//! Idle-time cache warming.
//!
//! A [`PrefetchScheduler`] walks a list of icon names and primes the shared
//! [`IconCache`] through the same resolve → fetch → sanitize pipeline the
//! loader uses, so a later real load is a cache hit. Warming is best-effort:
//! no widget is waiting, so failures are logged and swallowed, and because
//! failed entries are never cached a subsequent real load retries on its
//! own.

use std::sync::Arc;

use crate::cache::IconCache;
use crate::fetch::{HttpFetcher, IconFetcher};
use crate::resolver::IconResolver;
use crate::sanitize::sanitize;

/// Icon names the navigation shell shows on its landing view; embedders
/// typically hand this set to [`PrefetchScheduler::prefetch`] at startup.
pub const SHELL_PREFETCH_SET: [&str; 6] = [
    "angular",
    "react",
    "vue",
    "svelte",
    "typescript",
    "javascript",
];

/// An environment-provided idle-scheduling primitive.
///
/// Given a callback, runs it when the host has spare capacity. When none is
/// injected, work is scheduled immediately; either way the caller is never
/// blocked.
pub type IdleScheduler = Arc<dyn Fn(Box<dyn FnOnce() + Send>) + Send + Sync>;

/// Warms the icon cache ahead of need.
#[derive(Clone)]
pub struct PrefetchScheduler {
    cache: IconCache,
    resolver: IconResolver,
    fetcher: Arc<dyn IconFetcher>,
    idle: Option<IdleScheduler>,
}

impl PrefetchScheduler {
    /// A scheduler over the process-wide cache, default resolver, and HTTP
    /// fetcher, with immediate scheduling.
    pub fn new() -> Self {
        Self::with_parts(
            IconCache::global(),
            IconResolver::new(),
            Arc::new(HttpFetcher::new()),
        )
    }

    /// A scheduler over explicit collaborators: the same instances the
    /// loaders use, or a later real load will not hit the warmed entries.
    pub fn with_parts(
        cache: IconCache,
        resolver: IconResolver,
        fetcher: Arc<dyn IconFetcher>,
    ) -> Self {
        Self {
            cache,
            resolver,
            fetcher,
            idle: None,
        }
    }

    /// Route warming through an idle-scheduling primitive.
    pub fn with_idle_scheduler(mut self, idle: IdleScheduler) -> Self {
        self.idle = Some(idle);
        self
    }

    /// Warm the cache for `names`.
    ///
    /// Returns immediately; fetches run as background tasks on the current
    /// Tokio runtime (through the idle primitive when one is injected).
    /// Outside a runtime this logs a warning and does nothing; prefetching
    /// is an optimization, never a startup requirement.
    pub fn prefetch<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                target: "glyphfetch::prefetch",
                "prefetch of {} icons skipped: no async runtime",
                names.len()
            );
            return;
        };

        let scheduler = self.clone();
        let warm_all: Box<dyn FnOnce() + Send> = Box::new(move || {
            for name in names {
                let cache = scheduler.cache.clone();
                let url = scheduler.resolver.resolve(&name);
                let fetcher = Arc::clone(&scheduler.fetcher);
                runtime.spawn(async move {
                    let fetch = {
                        let fetcher = Arc::clone(&fetcher);
                        let url = url.clone();
                        move || async move {
                            let raw = fetcher.fetch_text(&url).await?;
                            Ok(sanitize(&raw))
                        }
                    };
                    match cache.get(&name, fetch).await {
                        Ok(_) => {
                            tracing::debug!(
                                target: "glyphfetch::prefetch",
                                "warmed icon '{name}'"
                            );
                        }
                        Err(err) => {
                            tracing::warn!(
                                target: "glyphfetch::prefetch",
                                "failed to prefetch icon '{name}': {err}"
                            );
                        }
                    }
                });
            }
        });

        match &self.idle {
            Some(idle) => idle(warm_all),
            None => warm_all(),
        }
    }
}

impl Default for PrefetchScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PrefetchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefetchScheduler")
            .field("cache", &self.cache)
            .field("idle", &self.idle.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use futures_util::FutureExt;
    use futures_util::future::BoxFuture;

    use super::*;
    use crate::error::{IconError, Result};
    use crate::loader::{IconLoader, LoadOutcome};

    struct CountingFetcher {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingFetcher {
        fn ok() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                    fail: false,
                },
                calls,
            )
        }

        fn failing() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                    fail: true,
                },
                calls,
            )
        }
    }

    impl IconFetcher for CountingFetcher {
        fn fetch_text(&self, _url: &str) -> BoxFuture<'static, Result<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            async move {
                if fail {
                    Err(IconError::network("unreachable"))
                } else {
                    Ok("<svg/>".to_string())
                }
            }
            .boxed()
        }
    }

    /// Let spawned warm tasks run to completion on the test runtime.
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefetch_warms_cache_for_each_name() {
        let cache = IconCache::new();
        let (fetcher, calls) = CountingFetcher::ok();
        let scheduler =
            PrefetchScheduler::with_parts(cache.clone(), IconResolver::new(), Arc::new(fetcher));

        scheduler.prefetch(["a", "b"]);
        settle().await;

        assert!(cache.contains("a"));
        assert!(cache.contains("b"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loader_hits_warmed_cache_without_refetch() {
        let cache = IconCache::new();
        let (fetcher, calls) = CountingFetcher::ok();
        let fetcher: Arc<dyn IconFetcher> = Arc::new(fetcher);
        let scheduler =
            PrefetchScheduler::with_parts(cache.clone(), IconResolver::new(), Arc::clone(&fetcher));

        scheduler.prefetch(["a"]);
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let loader = IconLoader::builder()
            .cache(cache)
            .fetcher(fetcher)
            .build();
        let outcome = loader.load("a").await;

        assert_eq!(outcome, LoadOutcome::Ready);
        // The prefetch fetch is the only one that ever happened.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefetch_failures_are_swallowed() {
        let cache = IconCache::new();
        let (fetcher, calls) = CountingFetcher::failing();
        let scheduler =
            PrefetchScheduler::with_parts(cache.clone(), IconResolver::new(), Arc::new(fetcher));

        scheduler.prefetch(SHELL_PREFETCH_SET);
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), SHELL_PREFETCH_SET.len());
        // No negative caching: a later real load starts fresh.
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_injected_idle_scheduler_is_used() {
        let cache = IconCache::new();
        let (fetcher, _) = CountingFetcher::ok();
        let invoked = Arc::new(AtomicBool::new(false));

        let idle: IdleScheduler = {
            let invoked = Arc::clone(&invoked);
            Arc::new(move |work: Box<dyn FnOnce() + Send>| {
                invoked.store(true, Ordering::SeqCst);
                work();
            })
        };

        let scheduler =
            PrefetchScheduler::with_parts(cache.clone(), IconResolver::new(), Arc::new(fetcher))
                .with_idle_scheduler(idle);

        scheduler.prefetch(["a"]);
        settle().await;

        assert!(invoked.load(Ordering::SeqCst));
        assert!(cache.contains("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_prefetch_is_a_no_op() {
        let cache = IconCache::new();
        let (fetcher, calls) = CountingFetcher::ok();
        let scheduler =
            PrefetchScheduler::with_parts(cache.clone(), IconResolver::new(), Arc::new(fetcher));

        scheduler.prefetch(Vec::<String>::new());
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deduped_against_concurrent_prefetch_of_same_name() {
        let cache = IconCache::new();
        let (fetcher, calls) = CountingFetcher::ok();
        let scheduler =
            PrefetchScheduler::with_parts(cache.clone(), IconResolver::new(), Arc::new(fetcher));

        scheduler.prefetch(["a"]);
        scheduler.prefetch(["a"]);
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
