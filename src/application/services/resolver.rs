//! Read-path services: shard routing and cached resolution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::repositories::Backend;
use crate::error::AppError;
use crate::infrastructure::cache::ResolutionCache;
use crate::utils::snowflake::ShortId;
use tracing::debug;

/// Outcome of resolving an external id.
///
/// Malformed ids, unknown shards, absent entries, and expired entries all
/// produce [`Resolution::NotFound`]; callers cannot tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    NotFound,
}

/// Immutable shard-number → backend dispatch table.
///
/// Built once at startup; there are no live shard changes.
pub struct ShardRouter {
    backends: HashMap<u64, Arc<dyn Backend>>,
}

impl ShardRouter {
    /// Builds the table from a set of backends.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when two backends report the same shard
    /// number - routing would be ambiguous, so startup must fail.
    pub fn new(backends: impl IntoIterator<Item = Arc<dyn Backend>>) -> Result<Self, AppError> {
        let mut map: HashMap<u64, Arc<dyn Backend>> = HashMap::new();
        for backend in backends {
            let shard = backend.shard_number();
            if map.insert(shard, backend).is_some() {
                return Err(AppError::Config(format!(
                    "duplicate shard number {shard} across configured backends"
                )));
            }
        }
        Ok(Self { backends: map })
    }

    fn backend_for(&self, shard: u64) -> Option<&Arc<dyn Backend>> {
        self.backends.get(&shard)
    }

    pub fn shard_count(&self) -> usize {
        self.backends.len()
    }
}

/// Cached read-path orchestrator: cache, then shard routing, then backend.
pub struct Resolver {
    router: ShardRouter,
    cache: Arc<dyn ResolutionCache>,
    default_ttl: Duration,
}

impl Resolver {
    pub fn new(router: ShardRouter, cache: Arc<dyn ResolutionCache>, default_ttl: Duration) -> Self {
        Self {
            router,
            cache,
            default_ttl,
        }
    }

    pub fn shard_count(&self) -> usize {
        self.router.shard_count()
    }

    /// Resolves an external id to its destination URL as of `now` (unix
    /// seconds).
    ///
    /// Confirmed backend answers are memoized: a hit for the TTL's duration
    /// (capped by the entry's own expiration), a miss as a negative entry for
    /// the default TTL. Ids that fail to decode or route to an unregistered
    /// shard are rejected before the backend and not cached.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] when the backend query fails; nothing is
    /// cached in that case.
    pub async fn resolve(&self, external_id: &str, now: i64) -> Result<Resolution, AppError> {
        if let Some(cached) = self.cache.get(external_id).await {
            return Ok(match cached {
                Some(url) => Resolution::Found(url),
                None => Resolution::NotFound,
            });
        }

        let id = match ShortId::parse_base58(external_id) {
            Ok(id) => id,
            Err(err) => {
                debug!("undecodable id {external_id:?}: {err}");
                return Ok(Resolution::NotFound);
            }
        };

        let Some(backend) = self.router.backend_for(id.node()) else {
            debug!("no backend for shard {} ({external_id})", id.node());
            return Ok(Resolution::NotFound);
        };

        match backend.query_by_id(id.to_raw(), now).await? {
            Some(entry) => {
                let ttl = match entry.expire_at {
                    // cap at the entry's remaining lifetime
                    Some(t) => self
                        .default_ttl
                        .min(Duration::from_secs(t.saturating_sub(now).max(0) as u64)),
                    None => self.default_ttl,
                };
                self.cache
                    .set(external_id, Some(entry.url.clone()), ttl)
                    .await;
                Ok(Resolution::Found(entry.url))
            }
            None => {
                self.cache.set(external_id, None, self.default_ttl).await;
                Ok(Resolution::NotFound)
            }
        }
    }
}
