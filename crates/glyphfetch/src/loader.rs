//! The per-widget icon loading controller.
//!
//! An [`IconLoader`] orchestrates resolve → cache lookup → fetch → sanitize,
//! retries once on failure after a fixed delay, and pushes loading/error/
//! content state to its [`RenderSurface`]. Each widget instance owns one
//! loader; all loaders typically share one [`IconCache`] and one fetcher.
//!
//! # State machine
//!
//! ```text
//! Idle -> Loading -> Ready
//!                 -> Retrying -> Loading -> Ready
//!                                        -> Failed
//! ```
//!
//! `Failed` is terminal for a request: the surface is told to show its
//! fallback indicator and no error escapes to the embedding application.
//! A newer `load` call supersedes any outstanding one; stale responses and
//! stale retry timers are discarded instead of overwriting newer state.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::IconCache;
use crate::color::{IconSize, resolve_color};
use crate::error::Result;
use crate::fetch::{HttpFetcher, IconFetcher};
use crate::resolver::IconResolver;
use crate::sanitize::sanitize;
use crate::surface::{NullSurface, RenderSurface};

/// Retries after the first failed attempt (so at most 2 fetches per load).
pub const MAX_RETRIES: u32 = 1;

/// Fixed delay between the failed attempt and its retry.
pub const RETRY_DELAY_MS: u64 = 3000;

/// Retry behavior for a load request.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay awaited before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

/// Observable state of a load request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    /// No request started yet.
    #[default]
    Idle,
    /// Resolve/fetch in progress.
    Loading,
    /// First attempt failed; waiting out the retry delay.
    Retrying,
    /// Sanitized content is available.
    Ready,
    /// Retries exhausted; the surface shows its fallback.
    Failed,
}

/// How a `load` call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Content was obtained and handed to the surface.
    Ready,
    /// Retries were exhausted; the surface shows its fallback.
    Failed,
    /// A newer load took over; this request changed nothing.
    Superseded,
}

/// The widget-facing properties of one icon request.
///
/// Owned by the embedding UI layer; the engine only consumes `name`. The
/// helpers mirror what the widget needs for styling and accessibility.
#[derive(Clone, Debug)]
pub struct IconRequest {
    /// Logical icon name, used as resolver input and cache key.
    pub name: String,
    /// Palette key or literal CSS color.
    pub color: Option<String>,
    /// Size variant.
    pub size: IconSize,
    /// Custom accessible label.
    pub aria_label: Option<String>,
    /// Whether the icon is decorative only.
    pub aria_hidden: bool,
}

impl IconRequest {
    /// Create a request for `name` with default presentation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            size: IconSize::default(),
            aria_label: None,
            aria_hidden: false,
        }
    }

    /// Set the color token.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set the size variant.
    pub fn with_size(mut self, size: IconSize) -> Self {
        self.size = size;
        self
    }

    /// Set a custom accessible label.
    pub fn with_aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    /// Mark the icon as decorative only.
    pub fn with_aria_hidden(mut self, hidden: bool) -> Self {
        self.aria_hidden = hidden;
        self
    }

    /// The CSS color the widget should apply, if any.
    pub fn style_color(&self) -> Option<String> {
        resolve_color(self.color.as_deref())
    }

    /// The accessible label, defaulting to the icon name and suppressed
    /// entirely for decorative icons.
    pub fn effective_aria_label(&self) -> Option<&str> {
        if self.aria_hidden {
            None
        } else {
            Some(self.aria_label.as_deref().unwrap_or(&self.name))
        }
    }
}

#[derive(Default)]
struct LoaderState {
    /// Generation of the currently active request. Guarded by the same lock
    /// as the fields it protects, so checking it and applying a result is
    /// one critical section.
    generation: u64,
    state: LoadState,
    content: Option<String>,
    has_error: bool,
}

/// Builder for [`IconLoader`].
pub struct IconLoaderBuilder {
    cache: Option<IconCache>,
    resolver: IconResolver,
    fetcher: Option<Arc<dyn IconFetcher>>,
    surface: Arc<dyn RenderSurface>,
    retry: RetryPolicy,
}

impl IconLoaderBuilder {
    fn new() -> Self {
        Self {
            cache: None,
            resolver: IconResolver::new(),
            fetcher: None,
            surface: Arc::new(NullSurface),
            retry: RetryPolicy::default(),
        }
    }

    /// Use a specific cache instead of the process-wide default.
    pub fn cache(mut self, cache: IconCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a specific resolver (shared with other loaders by cloning it).
    pub fn resolver(mut self, resolver: IconResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Use a specific fetcher implementation.
    pub fn fetcher(mut self, fetcher: impl IconFetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Attach the render surface updates are pushed to.
    pub fn surface(mut self, surface: impl RenderSurface + 'static) -> Self {
        self.surface = Arc::new(surface);
        self
    }

    /// Override the retry policy.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build the loader.
    pub fn build(self) -> IconLoader {
        IconLoader {
            cache: self.cache.unwrap_or_else(IconCache::global),
            resolver: self.resolver,
            fetcher: self
                .fetcher
                .unwrap_or_else(|| Arc::new(HttpFetcher::new())),
            surface: self.surface,
            retry: self.retry,
            state: Mutex::new(LoaderState::default()),
        }
    }
}

/// Orchestrates loading one widget's icon.
pub struct IconLoader {
    cache: IconCache,
    resolver: IconResolver,
    fetcher: Arc<dyn IconFetcher>,
    surface: Arc<dyn RenderSurface>,
    retry: RetryPolicy,
    state: Mutex<LoaderState>,
}

impl IconLoader {
    /// Start building a loader.
    pub fn builder() -> IconLoaderBuilder {
        IconLoaderBuilder::new()
    }

    /// A loader with process-wide cache, default resolver, and HTTP fetcher.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Current state of the most recent request.
    pub fn state(&self) -> LoadState {
        self.state.lock().state
    }

    /// Whether a request is in flight (loading or awaiting a retry).
    pub fn is_loading(&self) -> bool {
        matches!(self.state(), LoadState::Loading | LoadState::Retrying)
    }

    /// Whether the most recent request failed terminally.
    pub fn has_error(&self) -> bool {
        self.state.lock().has_error
    }

    /// Sanitized content of the most recent successful request.
    pub fn content(&self) -> Option<String> {
        self.state.lock().content.clone()
    }

    /// Load the icon named `name`.
    ///
    /// Resolves the URL, consults the shared cache (deduplicating against
    /// concurrent requests for the same name anywhere in the process),
    /// sanitizes fetched content, and retries once after
    /// [`RetryPolicy::delay`] on failure. Each call supersedes any
    /// outstanding `load` on this loader: the superseded request's late
    /// response or retry timer is discarded without touching state.
    ///
    /// Terminal failure is reported through the returned [`LoadOutcome`] and
    /// the surface's fallback indicator; no error propagates out.
    pub async fn load(&self, name: &str) -> LoadOutcome {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.state = LoadState::Loading;
            state.content = None;
            state.has_error = false;
            state.generation
        };
        self.surface.set_error(false);
        self.surface.set_loading(true);

        let mut attempt = 0u32;
        loop {
            let result = self.attempt(name).await;

            match result {
                Ok(content) => {
                    // The generation check and the state write share one
                    // critical section, so a stale response can never land
                    // after a newer load has already committed.
                    {
                        let mut state = self.state.lock();
                        if state.generation != generation {
                            return LoadOutcome::Superseded;
                        }
                        state.state = LoadState::Ready;
                        state.content = Some(content.clone());
                    }
                    self.surface.set_loading(false);
                    self.surface.set_content(&content);
                    return LoadOutcome::Ready;
                }
                Err(err) => {
                    if self.superseded(generation) {
                        return LoadOutcome::Superseded;
                    }

                    // The cache evicts failed entries itself; clearing again
                    // keeps the invariant under races with other loaders.
                    self.cache.clear(name);

                    if attempt >= self.retry.max_retries {
                        tracing::error!(
                            target: "glyphfetch::loader",
                            "failed to load icon '{name}' after {} attempts: {err}",
                            attempt + 1
                        );
                        {
                            let mut state = self.state.lock();
                            if state.generation != generation {
                                return LoadOutcome::Superseded;
                            }
                            state.state = LoadState::Failed;
                            state.has_error = true;
                        }
                        self.surface.set_loading(false);
                        self.surface.set_error(true);
                        return LoadOutcome::Failed;
                    }

                    tracing::warn!(
                        target: "glyphfetch::loader",
                        "icon '{name}' attempt {} failed, retrying in {:?}: {err}",
                        attempt + 1,
                        self.retry.delay
                    );
                    {
                        let mut state = self.state.lock();
                        if state.generation != generation {
                            return LoadOutcome::Superseded;
                        }
                        state.state = LoadState::Retrying;
                    }
                    tokio::time::sleep(self.retry.delay).await;

                    // A stale retry timer must not resurrect this request.
                    {
                        let mut state = self.state.lock();
                        if state.generation != generation {
                            return LoadOutcome::Superseded;
                        }
                        state.state = LoadState::Loading;
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// One resolve → cache → fetch → sanitize pass.
    async fn attempt(&self, name: &str) -> Result<String> {
        let url = self.resolver.resolve(name);
        let fetcher = Arc::clone(&self.fetcher);
        self.cache
            .get(name, move || async move {
                let raw = fetcher.fetch_text(&url).await?;
                Ok(sanitize(&raw))
            })
            .await
    }

    fn superseded(&self, generation: u64) -> bool {
        self.state.lock().generation != generation
    }
}

impl Default for IconLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IconLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("IconLoader")
            .field("state", &state.state)
            .field("has_error", &state.has_error)
            .finish()
    }
}
