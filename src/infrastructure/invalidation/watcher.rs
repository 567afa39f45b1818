//! Polling file-modification watcher.

use crate::infrastructure::invalidation::{ChangeSignal, InvalidationSource};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Fingerprint of a file's last observed state.
#[derive(PartialEq, Eq, Clone, Copy)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

fn stamp(path: &Path) -> Option<FileStamp> {
    let meta = fs::metadata(path).ok()?;
    Some(FileStamp {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}

/// Watches a set of files and emits an invalidation event when any of them
/// changes on disk.
///
/// Polls metadata on a fixed interval rather than relying on a platform
/// notification API; the subscriber contract is identical either way. An
/// unreadable file is skipped with a warning and picked up again once it
/// reappears.
pub struct FileModificationWatcher {
    paths: Vec<PathBuf>,
    poll_interval: Duration,
    signal: ChangeSignal,
}

impl FileModificationWatcher {
    pub fn new(paths: Vec<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            paths,
            poll_interval,
            signal: ChangeSignal::new(),
        }
    }

    /// Starts the polling task. Subscriptions taken before or after spawning
    /// both observe subsequent changes.
    pub fn spawn(&self) -> JoinHandle<()> {
        let paths = self.paths.clone();
        let signal = self.signal.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut stamps: HashMap<PathBuf, Option<FileStamp>> = HashMap::new();
            for path in &paths {
                let current = stamp(path);
                if current.is_none() {
                    warn!("cannot watch {}, will retry", path.display());
                }
                stamps.insert(path.clone(), current);
            }

            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut changed = false;
                for path in &paths {
                    let current = stamp(path);
                    let previous = stamps.insert(path.clone(), current);
                    if previous.is_some_and(|p| p != current) {
                        debug!("detected modification of {}", path.display());
                        changed = true;
                    }
                }
                if changed {
                    signal.notify();
                }
            }
        })
    }
}

impl InvalidationSource for FileModificationWatcher {
    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.signal.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scratch_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("surl-watch-{}-{name}", std::process::id()));
        fs::write(&path, b"initial").unwrap();
        path
    }

    #[tokio::test]
    async fn emits_event_when_file_changes() {
        let path = scratch_file("change");
        let watcher =
            FileModificationWatcher::new(vec![path.clone()], Duration::from_millis(10));
        let mut rx = watcher.subscribe();
        let task = watcher.spawn();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"more data").unwrap();
        file.sync_all().unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(event.is_ok(), "no invalidation event after file change");

        task.abort();
        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn silent_when_file_untouched() {
        let path = scratch_file("quiet");
        let watcher =
            FileModificationWatcher::new(vec![path.clone()], Duration::from_millis(10));
        let mut rx = watcher.subscribe();
        let task = watcher.spawn();

        let event = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(event.is_err(), "unexpected invalidation event");

        task.abort();
        let _ = fs::remove_file(&path);
    }
}
