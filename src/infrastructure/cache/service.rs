//! Cache service trait for memoized lookups.

use async_trait::async_trait;
use std::time::Duration;

/// A memoized resolution result.
///
/// `Some(url)` is a confirmed destination; `None` is a confirmed not-found
/// (negative entry, protecting backends from repeated-miss storms).
pub type CachedResolution = Option<String>;

/// Trait for memoizing external-id resolutions.
///
/// Implementations must be safe under concurrent access by many reader tasks
/// and the invalidation-listener task. An entry whose TTL has elapsed must
/// never be served.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::MemoryCache`] - in-process TTL cache
/// - [`crate::infrastructure::cache::NullCache`] - no-op for disabled caching
#[async_trait]
pub trait ResolutionCache: Send + Sync {
    /// Looks up a memoized resolution.
    ///
    /// # Returns
    ///
    /// - `Some(Some(url))` - confirmed destination
    /// - `Some(None)` - confirmed not-found
    /// - `None` - unknown; the caller must resolve and populate
    async fn get(&self, key: &str) -> Option<CachedResolution>;

    /// Stores a resolution for `ttl`. A zero `ttl` is a no-op.
    async fn set(&self, key: &str, value: CachedResolution, ttl: Duration);

    /// Drops every entry. Invoked when underlying data changed out-of-band.
    async fn flush(&self);
}
