//! Icon name to URL resolution.
//!
//! An [`IconResolver`] maps a logical icon name (`"angular"`) to a fetchable
//! URL. The default convention targets the Simple Icons CDN; the mapping can
//! be swapped at runtime without touching the loaders that share the
//! resolver, because the handle is clonable and the strategy lives behind it.

use std::sync::Arc;

use parking_lot::RwLock;

/// A resolution strategy: icon name in, URL out.
///
/// Resolvers are assumed cheap and pure; the output is recomputed on every
/// lookup and never cached.
pub type ResolverFn = dyn Fn(&str) -> String + Send + Sync;

/// Base URL of the default CDN convention (Simple Icons via jsDelivr).
pub const DEFAULT_CDN_BASE: &str = "https://cdn.jsdelivr.net/npm/simple-icons@latest/icons";

fn default_resolve(name: &str) -> String {
    format!("{DEFAULT_CDN_BASE}/{name}.svg")
}

/// Maps icon names to fetchable URLs, with a swappable strategy.
///
/// Clones share the same strategy: overriding the resolver through any clone
/// affects every loader and prefetcher holding one. Icon names are not
/// validated; a malformed name simply produces a URL that fails at fetch
/// time.
#[derive(Clone)]
pub struct IconResolver {
    custom: Arc<RwLock<Option<Arc<ResolverFn>>>>,
}

impl IconResolver {
    /// Create a resolver using the default CDN convention.
    pub fn new() -> Self {
        Self {
            custom: Arc::new(RwLock::new(None)),
        }
    }

    /// Resolve an icon name to a URL using the active strategy.
    pub fn resolve(&self, name: &str) -> String {
        match self.custom.read().as_ref() {
            Some(resolver) => resolver(name),
            None => default_resolve(name),
        }
    }

    /// Replace the resolution strategy for every holder of this resolver.
    pub fn set_resolver(&self, resolver: impl Fn(&str) -> String + Send + Sync + 'static) {
        *self.custom.write() = Some(Arc::new(resolver));
    }

    /// Restore the default CDN convention.
    pub fn reset_resolver(&self) {
        *self.custom.write() = None;
    }
}

impl Default for IconResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IconResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconResolver")
            .field("custom", &self.custom.read().is_some())
            .finish()
    }
}
