//! In-memory backend implementation.

use crate::domain::entities::UrlEntry;
use crate::domain::repositories::Backend;
use crate::error::AppError;
use crate::utils::snowflake::MAX_NODE;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// A non-persistent shard holding entries in a hash map.
///
/// Satisfies the full [`Backend`] contract, including swap-based cleanup, and
/// doubles as the storage fake in tests.
pub struct MemoryBackend {
    shard: u64,
    entries: RwLock<HashMap<u64, UrlEntry>>,
}

impl MemoryBackend {
    /// Creates an empty shard.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if `shard` exceeds [`MAX_NODE`].
    pub fn new(shard: u64) -> Result<Self, AppError> {
        if shard > MAX_NODE {
            return Err(AppError::Config(format!(
                "shard number {shard} out of range 0-{MAX_NODE}"
            )));
        }
        Ok(Self {
            shard,
            entries: RwLock::new(HashMap::new()),
        })
    }

    /// Total stored rows, expired ones included.
    pub fn count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    fn read_entries(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<u64, UrlEntry>>, AppError> {
        self.entries
            .read()
            .map_err(|_| AppError::Internal("memory backend lock poisoned".into()))
    }

    fn write_entries(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<u64, UrlEntry>>, AppError> {
        self.entries
            .write()
            .map_err(|_| AppError::Internal("memory backend lock poisoned".into()))
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn insert(&self, entry: UrlEntry) -> Result<(), AppError> {
        let mut entries = self.write_entries()?;
        if entries.contains_key(&entry.id) {
            return Err(AppError::storage(format!("duplicate id {}", entry.id)));
        }
        entries.insert(entry.id, entry);
        Ok(())
    }

    async fn query_by_url(&self, url: &str, now: i64) -> Result<Vec<UrlEntry>, AppError> {
        let entries = self.read_entries()?;
        let mut found: Vec<UrlEntry> = entries
            .values()
            .filter(|e| e.url == url && e.is_visible(now))
            .cloned()
            .collect();
        found.sort_by_key(|e| e.id);
        Ok(found)
    }

    async fn query_by_id(&self, id: u64, now: i64) -> Result<Option<UrlEntry>, AppError> {
        let entries = self.read_entries()?;
        Ok(entries.get(&id).filter(|e| e.is_visible(now)).cloned())
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        let mut entries = self.write_entries()?;
        Ok(entries.remove(&id).is_some())
    }

    async fn clear_expired(&self, now: i64) -> Result<u64, AppError> {
        let mut entries = self.write_entries()?;
        let retained: HashMap<u64, UrlEntry> = entries
            .iter()
            .filter(|(_, e)| e.expire_at.is_none_or(|t| t > now))
            .map(|(id, e)| (*id, e.clone()))
            .collect();
        let removed = (entries.len() - retained.len()) as u64;
        // Publish the rebuilt map in one step.
        *entries = retained;
        Ok(removed)
    }

    fn shard_number(&self) -> u64 {
        self.shard
    }
}
