//! Invalidation event source trait and the manual signal implementation.

use tokio::sync::broadcast;

const SIGNAL_BUFFER: usize = 16;

/// Emits a unit event whenever underlying data may have changed out-of-band.
///
/// Subscribers treat every event identically (flush everything); the payload
/// carries no per-key information by design.
pub trait InvalidationSource: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<()>;
}

/// A manually triggered invalidation source.
///
/// Administrative code calls [`ChangeSignal::notify`] after mutating storage
/// behind a running reader's back.
#[derive(Clone)]
pub struct ChangeSignal {
    tx: broadcast::Sender<()>,
}

impl ChangeSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_BUFFER);
        Self { tx }
    }

    /// Broadcasts a change event. A send with no live subscribers is fine.
    pub fn notify(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for ChangeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl InvalidationSource for ChangeSignal {
    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}
