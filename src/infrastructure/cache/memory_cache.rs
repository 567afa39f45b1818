//! In-process TTL cache implementation.

use super::service::{CachedResolution, ResolutionCache};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

struct Slot {
    value: CachedResolution,
    deadline: Instant,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// TTL-bounded in-memory cache with negative-result entries.
///
/// Expired slots are evicted lazily: a read that finds one removes it and
/// reports a miss, so a stale entry is never served. `flush` drops the whole
/// map at once - invalidation is coarse by design, since out-of-band changes
/// are rare relative to reads and correctness outweighs hit ratio.
pub struct MemoryCache {
    slots: RwLock<HashMap<String, Slot>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live (unexpired) entries. Test and diagnostics helper.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.slots
            .read()
            .map(|slots| slots.values().filter(|s| !s.is_expired(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResolutionCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<CachedResolution> {
        let now = Instant::now();

        {
            let slots = self.slots.read().ok()?;
            match slots.get(key) {
                Some(slot) if !slot.is_expired(now) => {
                    debug!("cache hit: {key}");
                    return Some(slot.value.clone());
                }
                Some(_) => {} // expired, evict below
                None => return None,
            }
        }

        if let Ok(mut slots) = self.slots.write() {
            // Re-check under the write lock; another task may have refreshed it.
            if slots.get(key).is_some_and(|slot| slot.is_expired(now)) {
                slots.remove(key);
            }
        }
        None
    }

    async fn set(&self, key: &str, value: CachedResolution, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        if let Ok(mut slots) = self.slots.write() {
            debug!("cache set: {key} (ttl {}s)", ttl.as_secs());
            slots.insert(
                key.to_string(),
                Slot {
                    value,
                    deadline: Instant::now() + ttl,
                },
            );
        }
    }

    async fn flush(&self) {
        if let Ok(mut slots) = self.slots.write() {
            debug!("cache flush: dropping {} entries", slots.len());
            slots.clear();
        }
    }
}
