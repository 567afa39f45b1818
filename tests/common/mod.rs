#![allow(dead_code)]

use axum::Router;
use axum::routing::get;
use axum_test::TestServer;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use surl::api::handlers::{health_handler, redirect_handler};
use surl::application::services::{Manager, Resolver, ShardRouter};
use surl::domain::entities::UrlEntry;
use surl::domain::repositories::Backend;
use surl::error::AppError;
use surl::infrastructure::cache::ResolutionCache;
use surl::infrastructure::persistence::MemoryBackend;
use surl::state::AppState;
use surl::utils::snowflake::ShortId;

pub const EPOCH: u64 = 1_657_436_936_000;
pub const CACHE_TTL: Duration = Duration::from_secs(300);

pub fn memory_shard(shard: u64) -> Arc<MemoryBackend> {
    Arc::new(MemoryBackend::new(shard).unwrap())
}

/// Inserts `url` through the write path and returns the allocated id.
pub async fn seed(backend: &Arc<MemoryBackend>, url: &str, expire_at: Option<i64>) -> ShortId {
    let manager = Manager::new(backend.clone(), EPOCH).unwrap();
    manager.insert_or_reuse(url, expire_at).await.unwrap()
}

pub fn build_resolver(
    backends: Vec<Arc<dyn Backend>>,
    cache: Arc<dyn ResolutionCache>,
) -> Arc<Resolver> {
    Arc::new(Resolver::new(
        ShardRouter::new(backends).unwrap(),
        cache,
        CACHE_TTL,
    ))
}

pub fn test_state(resolver: Arc<Resolver>, strict_host: Option<String>) -> AppState {
    AppState {
        resolver,
        strict_host,
    }
}

pub fn test_server(state: AppState) -> TestServer {
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/{id}", get(redirect_handler))
        .with_state(state);
    TestServer::new(app).unwrap()
}

/// [`MemoryBackend`] wrapper counting `query_by_id` calls, for asserting that
/// the cache actually short-circuits backend lookups.
pub struct CountingBackend {
    inner: MemoryBackend,
    id_queries: AtomicUsize,
}

impl CountingBackend {
    pub fn new(shard: u64) -> Self {
        Self {
            inner: MemoryBackend::new(shard).unwrap(),
            id_queries: AtomicUsize::new(0),
        }
    }

    pub fn id_queries(&self) -> usize {
        self.id_queries.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Backend for CountingBackend {
    async fn insert(&self, entry: UrlEntry) -> Result<(), AppError> {
        self.inner.insert(entry).await
    }

    async fn query_by_url(&self, url: &str, now: i64) -> Result<Vec<UrlEntry>, AppError> {
        self.inner.query_by_url(url, now).await
    }

    async fn query_by_id(&self, id: u64, now: i64) -> Result<Option<UrlEntry>, AppError> {
        self.id_queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query_by_id(id, now).await
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        self.inner.delete(id).await
    }

    async fn clear_expired(&self, now: i64) -> Result<u64, AppError> {
        self.inner.clear_expired(now).await
    }

    fn shard_number(&self) -> u64 {
        self.inner.shard_number()
    }
}
