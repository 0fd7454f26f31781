//! CDN icon fetching, caching, and SVG sanitization for UI toolkits.
//!
//! This crate is the engine behind an icon widget: it turns a logical icon
//! name into sanitized SVG markup, with a deduplicating process-wide cache,
//! one retry on failure, and idle-time prefetching. The surrounding UI
//! (templates, theming, layout) stays outside; the engine talks to it only
//! through the [`RenderSurface`] trait.
//!
//! # Loading an icon
//!
//! ```ignore
//! use glyphfetch::IconLoader;
//!
//! let loader = IconLoader::new();
//! let outcome = loader.load("angular").await;
//!
//! if let Some(svg) = loader.content() {
//!     // hand the sanitized markup to your widget
//! }
//! ```
//!
//! # Sharing a cache and swapping the CDN
//!
//! Loaders deduplicate across each other when they share a cache; the
//! default is a process-wide one. The name → URL mapping is swappable at
//! runtime through a shared [`IconResolver`]:
//!
//! ```ignore
//! use glyphfetch::{IconCache, IconLoader, IconResolver};
//!
//! let cache = IconCache::new();
//! let resolver = IconResolver::new();
//! resolver.set_resolver(|name| format!("https://icons.internal/{name}.svg"));
//!
//! let loader = IconLoader::builder()
//!     .cache(cache.clone())
//!     .resolver(resolver.clone())
//!     .build();
//! ```
//!
//! # Warming the cache
//!
//! ```ignore
//! use glyphfetch::{PrefetchScheduler, SHELL_PREFETCH_SET};
//!
//! // At startup, from within the async runtime:
//! PrefetchScheduler::new().prefetch(SHELL_PREFETCH_SET);
//! ```
//!
//! # Sanitization
//!
//! Fetched markup is sanitized before it is cached or surfaced: `<script>`
//! and `<foreignObject>` blocks and `on*` handlers are stripped, and a
//! structural pass keeps only allow-listed SVG elements and attributes.
//! [`sanitize()`] is also exported for standalone use.

pub mod cache;
pub mod color;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod prefetch;
pub mod resolver;
pub mod sanitize;
pub mod surface;

pub use crate::cache::IconCache;
pub use crate::color::{IconSize, JEWEL_PALETTE, resolve_color};
pub use crate::error::{IconError, Result};
pub use crate::fetch::{HttpFetcher, HttpFetcherConfig, IconFetcher};
pub use crate::loader::{
    IconLoader, IconLoaderBuilder, IconRequest, LoadOutcome, LoadState, MAX_RETRIES,
    RETRY_DELAY_MS, RetryPolicy,
};
pub use crate::prefetch::{IdleScheduler, PrefetchScheduler, SHELL_PREFETCH_SET};
pub use crate::resolver::{DEFAULT_CDN_BASE, IconResolver, ResolverFn};
pub use crate::sanitize::sanitize;
pub use crate::surface::{NullSurface, RenderSurface};
