//! No-op cache implementation for disabled caching.

use super::service::{CachedResolution, ResolutionCache};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A cache implementation that stores nothing.
///
/// Every lookup is a miss, so all resolutions go to the backends. Used when
/// caching is explicitly disabled by configuration.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        debug!("using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResolutionCache for NullCache {
    async fn get(&self, _key: &str) -> Option<CachedResolution> {
        None
    }

    async fn set(&self, _key: &str, _value: CachedResolution, _ttl: Duration) {}

    async fn flush(&self) {}
}
