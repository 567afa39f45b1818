//! Background task wiring an invalidation source to a cache flush.

use crate::infrastructure::cache::ResolutionCache;
use crate::infrastructure::invalidation::InvalidationSource;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::info;

/// Spawns the per-process invalidation listener.
///
/// Every received event flushes the whole cache. A lagged receiver also
/// flushes - missed events still mean "something changed". The task exits
/// when the source's sender side is dropped.
pub fn spawn_flush_listener(
    cache: Arc<dyn ResolutionCache>,
    source: &dyn InvalidationSource,
) -> JoinHandle<()> {
    let mut rx = source.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(()) => {
                    info!("change signal received, flushing cache");
                    cache.flush().await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    info!("invalidation listener lagged {skipped} events, flushing cache");
                    cache.flush().await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
