//! Storage backends, caching, and cache-invalidation plumbing.

pub mod cache;
pub mod invalidation;
pub mod persistence;
