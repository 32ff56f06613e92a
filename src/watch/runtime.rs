//! Watch daemon loop.

use super::events::{ChangeEvent, EventBatcher};
use crate::config::WatchConfig;
use crate::error::ApiError;
use crate::tree::TreeHandle;
use notify::{RecursiveMode, Watcher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Upper bound on how long the loop waits before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cloneable handle that ends a running [`WatchDaemon`] loop.
#[derive(Debug, Clone)]
pub struct WatchStopper(Arc<AtomicBool>);

impl WatchStopper {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Watch mode daemon
pub struct WatchDaemon {
    handle: Arc<TreeHandle>,
    config: WatchConfig,
    stopped: Arc<AtomicBool>,
}

impl WatchDaemon {
    pub fn new(handle: Arc<TreeHandle>, config: WatchConfig) -> Self {
        Self {
            handle,
            config,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stopper(&self) -> WatchStopper {
        WatchStopper(Arc::clone(&self.stopped))
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Stop the watch daemon
    pub fn stop(&self) {
        self.stopper().stop();
    }

    /// Watch the tree root and rebuild after each batch of changes. Blocks
    /// until [`stop`](Self::stop) is called or the watcher goes away. A stop
    /// requested before the call makes it return right after setup.
    ///
    /// Build failures are logged and the loop keeps going; the previous
    /// snapshot stays live.
    pub fn run(&self) -> Result<(), ApiError> {
        let root = self.handle.builder().root().to_path_buf();

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            // The receiver is gone once the loop exited.
            let _ = tx.send(res);
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!(root = %root.display(), "Watching tree");

        // Events carry resolved absolute paths.
        let event_root = dunce::canonicalize(&root).unwrap_or_else(|_| root.clone());
        let mut batcher = EventBatcher::new(
            event_root,
            self.handle.builder().ignore_pattern().clone(),
            self.config.clone(),
        );

        while !self.is_stopped() {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(event)) => {
                    if let Some(change) = ChangeEvent::from_notify(&event) {
                        if !batcher.add_event(change) {
                            debug!(paths = ?event.paths, "Ignoring change");
                        }
                    }
                }
                Ok(Err(e)) => warn!(error = %e, "Watch error"),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    error!("Watcher channel disconnected");
                    break;
                }
            }

            if !batcher.is_empty() && batcher.is_ready() {
                let events = batcher.take_batch();
                info!(event_count = events.len(), "Processing change events");
                // Failures are already reported by the handle.
                let _ = self.handle.rebuild();
            }
        }

        info!(root = %root.display(), "Stopped watching tree");
        Ok(())
    }
}
