//! Write-path service: deduplicating inserts and expired-row cleanup.

use std::sync::Arc;

use crate::domain::entities::UrlEntry;
use crate::domain::repositories::Backend;
use crate::error::AppError;
use crate::utils::snowflake::{IdGenerator, ShortId};
use chrono::Utc;
use url::Url;

/// Service for inserting destination URLs into one shard.
///
/// Bound to a single backend; deduplication never searches other shards.
/// Identifier allocation goes through an [`IdGenerator`] whose node number is
/// the backend's shard number, which is what keeps invariant "id decodes to
/// its storing shard" true.
pub struct Manager<B: Backend> {
    backend: Arc<B>,
    generator: IdGenerator,
}

impl<B: Backend> Manager<B> {
    /// Creates a manager for `backend`, minting ids against `epoch_millis`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the backend reports a shard number
    /// outside the encodable range.
    pub fn new(backend: Arc<B>, epoch_millis: u64) -> Result<Self, AppError> {
        let generator = IdGenerator::new(backend.shard_number(), epoch_millis)?;
        Ok(Self { backend, generator })
    }

    /// Inserts `dst_url`, reusing an existing entry where possible.
    ///
    /// An existing visible entry is reused when `expire_at` is `None` and the
    /// entry has no expiration, or when both expirations match exactly. Two
    /// inserts with different non-null expirations always produce distinct
    /// entries; expirations are never merged or extended.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidUrl`] if `dst_url` is not an absolute URL
    /// - [`AppError::AlreadyExpired`] if `expire_at` is not in the future;
    ///   nothing is stored
    /// - [`AppError::ClockRegression`] from id generation
    /// - [`AppError::Storage`] from the backend
    pub async fn insert_or_reuse(
        &self,
        dst_url: &str,
        expire_at: Option<i64>,
    ) -> Result<ShortId, AppError> {
        Url::parse(dst_url).map_err(|e| AppError::InvalidUrl(format!("{dst_url}: {e}")))?;

        let now = Utc::now().timestamp();
        if let Some(t) = expire_at {
            if t <= now {
                return Err(AppError::AlreadyExpired(t));
            }
        }

        let existing = self.backend.query_by_url(dst_url, now).await?;
        for entry in existing {
            let matches = match (expire_at, entry.expire_at) {
                (None, None) => true,
                (Some(want), Some(have)) => want == have,
                _ => false,
            };
            if matches {
                return Ok(ShortId::from_raw(entry.id));
            }
        }

        let id = self.generator.generate()?;
        self.backend
            .insert(UrlEntry::new(id.to_raw(), dst_url, expire_at))
            .await?;
        Ok(id)
    }

    /// Removes one entry. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] from the backend.
    pub async fn delete(&self, id: ShortId) -> Result<bool, AppError> {
        self.backend.delete(id.to_raw()).await
    }

    /// Removes every entry expired as of now; returns the removed count.
    ///
    /// The reference timestamp is captured once, so entries expiring while
    /// the cleanup runs are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] from the backend; a failed cleanup
    /// removes nothing.
    pub async fn clean(&self) -> Result<u64, AppError> {
        let now = Utc::now().timestamp();
        self.backend.clear_expired(now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockBackend;

    const EPOCH: u64 = 1_657_436_936_000;

    fn manager_with(mock: MockBackend) -> Manager<MockBackend> {
        Manager::new(Arc::new(mock), EPOCH).unwrap()
    }

    fn future(secs: i64) -> i64 {
        Utc::now().timestamp() + secs
    }

    #[tokio::test]
    async fn inserts_new_url() {
        let mut mock = MockBackend::new();
        mock.expect_shard_number().return_const(5u64);
        mock.expect_query_by_url()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_insert()
            .withf(|entry| entry.url == "https://example.com/page" && entry.expire_at.is_none())
            .times(1)
            .returning(|_| Ok(()));

        let manager = manager_with(mock);
        let id = manager
            .insert_or_reuse("https://example.com/page", None)
            .await
            .unwrap();
        assert_eq!(id.node(), 5);
    }

    #[tokio::test]
    async fn reuses_unexpiring_entry() {
        let mut mock = MockBackend::new();
        mock.expect_shard_number().return_const(0u64);
        mock.expect_query_by_url()
            .times(1)
            .returning(|_, _| Ok(vec![UrlEntry::new(42, "https://example.com", None)]));
        mock.expect_insert().times(0);

        let manager = manager_with(mock);
        let id = manager
            .insert_or_reuse("https://example.com", None)
            .await
            .unwrap();
        assert_eq!(id.to_raw(), 42);
    }

    #[tokio::test]
    async fn reuses_entry_with_exactly_matching_expiration() {
        let t = future(3600);
        let mut mock = MockBackend::new();
        mock.expect_shard_number().return_const(0u64);
        mock.expect_query_by_url()
            .times(1)
            .returning(move |_, _| Ok(vec![UrlEntry::new(42, "https://example.com", Some(t))]));
        mock.expect_insert().times(0);

        let manager = manager_with(mock);
        let id = manager
            .insert_or_reuse("https://example.com", Some(t))
            .await
            .unwrap();
        assert_eq!(id.to_raw(), 42);
    }

    #[tokio::test]
    async fn different_expiration_allocates_new_id() {
        let t = future(3600);
        let mut mock = MockBackend::new();
        mock.expect_shard_number().return_const(0u64);
        mock.expect_query_by_url()
            .times(1)
            .returning(move |_, _| Ok(vec![UrlEntry::new(42, "https://example.com", Some(t))]));
        mock.expect_insert().times(1).returning(|_| Ok(()));

        let manager = manager_with(mock);
        let id = manager
            .insert_or_reuse("https://example.com", Some(t - 1))
            .await
            .unwrap();
        assert_ne!(id.to_raw(), 42);
    }

    #[tokio::test]
    async fn unexpiring_request_does_not_reuse_expiring_entry() {
        let t = future(3600);
        let mut mock = MockBackend::new();
        mock.expect_shard_number().return_const(0u64);
        mock.expect_query_by_url()
            .times(1)
            .returning(move |_, _| Ok(vec![UrlEntry::new(42, "https://example.com", Some(t))]));
        mock.expect_insert().times(1).returning(|_| Ok(()));

        let manager = manager_with(mock);
        let id = manager
            .insert_or_reuse("https://example.com", None)
            .await
            .unwrap();
        assert_ne!(id.to_raw(), 42);
    }

    #[tokio::test]
    async fn rejects_relative_url() {
        let mut mock = MockBackend::new();
        mock.expect_shard_number().return_const(0u64);
        mock.expect_query_by_url().times(0);
        mock.expect_insert().times(0);

        let manager = manager_with(mock);
        let result = manager.insert_or_reuse("not-a-url", None).await;
        assert!(matches!(result, Err(AppError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn rejects_past_expiration_without_storing() {
        let mut mock = MockBackend::new();
        mock.expect_shard_number().return_const(0u64);
        mock.expect_query_by_url().times(0);
        mock.expect_insert().times(0);

        let manager = manager_with(mock);
        let past = Utc::now().timestamp() - 100;
        let result = manager
            .insert_or_reuse("https://example.com", Some(past))
            .await;
        assert!(matches!(result, Err(AppError::AlreadyExpired(t)) if t == past));
    }

    #[tokio::test]
    async fn storage_error_propagates() {
        let mut mock = MockBackend::new();
        mock.expect_shard_number().return_const(0u64);
        mock.expect_query_by_url()
            .times(1)
            .returning(|_, _| Err(AppError::storage("disk gone")));

        let manager = manager_with(mock);
        let result = manager.insert_or_reuse("https://example.com", None).await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn clean_delegates_to_backend() {
        let mut mock = MockBackend::new();
        mock.expect_shard_number().return_const(0u64);
        mock.expect_clear_expired().times(1).returning(|_| Ok(3));

        let manager = manager_with(mock);
        assert_eq!(manager.clean().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn shard_number_out_of_range_is_fatal() {
        let mut mock = MockBackend::new();
        mock.expect_shard_number().return_const(1024u64);

        assert!(matches!(
            Manager::new(Arc::new(mock), EPOCH),
            Err(AppError::Config(_))
        ));
    }
}
