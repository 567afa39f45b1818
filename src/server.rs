//! HTTP server initialization and runtime setup.
//!
//! Opens the shard files, builds the routing table and cache, spawns the
//! invalidation plumbing, and runs the Axum server.

use crate::config::Config;
use crate::application::services::{Resolver, ShardRouter};
use crate::domain::repositories::Backend;
use crate::infrastructure::cache::{MemoryCache, NullCache, ResolutionCache};
use crate::infrastructure::invalidation::{FileModificationWatcher, spawn_flush_listener};
use crate::infrastructure::persistence::SqliteBackend;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::Result;
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - one read-only SQLite backend per shard file
/// - the shard router (fails on duplicate shard numbers)
/// - the resolution cache plus its file-watch flush listener
/// - the Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if a shard file cannot be opened, shard numbers collide,
/// or the server cannot bind.
pub async fn run(config: Config) -> Result<()> {
    let mut backends: Vec<Arc<dyn Backend>> = Vec::new();
    for path in &config.shard_paths {
        let backend = SqliteBackend::open_read(path).await?;
        tracing::info!("opened shard {} from {}", backend.shard_number(), path.display());
        backends.push(Arc::new(backend));
    }

    let router = ShardRouter::new(backends)?;
    tracing::info!("routing {} shard(s)", router.shard_count());

    let cache: Arc<dyn ResolutionCache> = if config.cache_enabled {
        Arc::new(MemoryCache::new())
    } else {
        Arc::new(NullCache::new())
    };

    if config.cache_enabled {
        let watcher = FileModificationWatcher::new(config.shard_paths.clone(), config.watch_poll());
        let _listener = spawn_flush_listener(cache.clone(), &watcher);
        let _watcher = watcher.spawn();
        tracing::info!("cache enabled (ttl {}s, flush on shard-file change)", config.cache_ttl_seconds);
    } else {
        tracing::info!("cache disabled");
    }

    let resolver = Arc::new(Resolver::new(router, cache, config.cache_ttl()));
    let state = AppState {
        resolver,
        strict_host: config.expected_host(),
    };

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
