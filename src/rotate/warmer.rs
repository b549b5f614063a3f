//! Background index warmer
//!
//! Promotes freshly staged generations from a daemon thread so the
//! serving path flips to a new index without waiting for the next
//! request to notice it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use tracing::warn;

use super::rotator::Rotator;
use crate::config::IndexConfig;

pub struct Warmer {
    shutdown: Sender<()>,
    join: thread::JoinHandle<()>,
}

impl Warmer {
    /// Spawn per configuration; `None` when warming is disabled
    pub fn from_config(config: &IndexConfig, rotator: Arc<Rotator>) -> Option<Warmer> {
        if config.warm_interval_secs == 0 {
            return None;
        }
        Some(Self::spawn(
            rotator,
            Duration::from_secs(config.warm_interval_secs),
        ))
    }

    /// Start the warming thread with an explicit interval
    pub fn spawn(rotator: Arc<Rotator>, interval: Duration) -> Warmer {
        let (shutdown, rx) = bounded::<()>(1);
        let join = thread::spawn(move || loop {
            match rx.recv_timeout(interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(e) = rotator.refresh() {
                        // Rotation failures are retriable; keep the loop alive
                        warn!("warmer refresh failed: {}", e);
                    }
                }
            }
        });
        Warmer { shutdown, join }
    }

    /// Stop the thread and wait for it to exit
    pub fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.join.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use crate::rotate::SlotPaths;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_zero_interval_disables_warming() {
        let tmp = TempDir::new().unwrap();
        let config = IndexConfig::new(tmp.path().join("data"), tmp.path().join("idx"));
        let rotator = Arc::new(Rotator::new(
            SlotPaths::new(tmp.path().join("idx")),
            config.retention,
        ));
        assert!(Warmer::from_config(&config, rotator).is_none());
    }

    #[test]
    fn test_warmer_promotes_pending() {
        let tmp = TempDir::new().unwrap();
        let corpus_dir = tmp.path().join("data");
        let index_root = tmp.path().join("idx");
        fs::create_dir_all(&corpus_dir).unwrap();
        fs::create_dir_all(&index_root).unwrap();
        fs::write(corpus_dir.join("doc1.txt"), "South Africa").unwrap();

        let config = IndexConfig::new(corpus_dir, index_root.clone());
        let rotator = Arc::new(Rotator::new(SlotPaths::new(&index_root), config.retention));

        IndexBuilder::new(config).build(rotator.slots()).unwrap();
        rotator.stage().unwrap().unwrap();
        assert!(rotator.slots().pending_dir().exists());

        let warmer = Warmer::spawn(rotator.clone(), Duration::from_millis(10));
        // Wait for the warmer to pick the pending generation up
        for _ in 0..200 {
            if rotator.slots().live_dir().exists() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        warmer.shutdown();

        assert!(!rotator.slots().pending_dir().exists());
        assert!(rotator.slots().live_dir().exists());
        assert_eq!(rotator.current().unwrap().generation(), 1);
    }
}
