//! Caching layer for resolved lookups.
//!
//! Provides a [`ResolutionCache`] trait with two implementations:
//! - [`MemoryCache`] - in-process TTL cache with negative-result support
//! - [`NullCache`] - no-op implementation for disabled caching

mod memory_cache;
mod null_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use null_cache::NullCache;
pub use service::{CachedResolution, ResolutionCache};
