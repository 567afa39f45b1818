//! Storage capability trait consumed by the core.

use crate::domain::entities::UrlEntry;
use crate::error::AppError;
use async_trait::async_trait;

/// A storage shard holding short-URL entries.
///
/// The storage format is opaque to the core; only the contract below matters.
/// All query operations take an explicit `now` (unix seconds) so visibility
/// filtering and cleanup are deterministic.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::SqliteBackend`] - SQLite shard file
/// - [`crate::infrastructure::persistence::MemoryBackend`] - in-memory shard
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stores a new entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if the entry cannot be stored (including
    /// a duplicate id, which indicates a broken generator upstream).
    async fn insert(&self, entry: UrlEntry) -> Result<(), AppError>;

    /// Returns all entries for `url` still visible at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] on storage failures.
    async fn query_by_url(&self, url: &str, now: i64) -> Result<Vec<UrlEntry>, AppError>;

    /// Returns the entry with `id` if it exists and is visible at `now`.
    ///
    /// Expired entries are indistinguishable from absent ones.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] on storage failures.
    async fn query_by_id(&self, id: u64, now: i64) -> Result<Option<UrlEntry>, AppError>;

    /// Removes a single entry. Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] on storage failures.
    async fn delete(&self, id: u64) -> Result<bool, AppError>;

    /// Atomically removes every entry with `expire_at <= now` and returns the
    /// number of removed rows.
    ///
    /// Must be implemented as build-replacement-then-swap so concurrent
    /// readers never observe a partially cleared state, and must not remove
    /// entries expiring after `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] on storage failures; a failed cleanup
    /// removes nothing.
    async fn clear_expired(&self, now: i64) -> Result<u64, AppError>;

    /// The shard number this backend stores, in `[0, 1023]`.
    ///
    /// Every entry id stored here decodes back to this number.
    fn shard_number(&self) -> u64;
}
