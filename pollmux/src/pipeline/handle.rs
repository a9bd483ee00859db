//! Client-side handle for a running pipeline

use std::sync::{Arc, Mutex};

use eyre::Result;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::registry::SessionRegistry;

/// Handle to a running pipeline
///
/// [`shutdown`](PipelineHandle::shutdown) is the orderly teardown path.
/// Dropping the handle also cancels the pipeline, because the shutdown
/// channel closes with it.
pub struct PipelineHandle {
    shutdown_tx: watch::Sender<bool>,
    registry: Arc<Mutex<SessionRegistry>>,
    root: JoinHandle<()>,
}

impl PipelineHandle {
    pub(crate) fn new(
        shutdown_tx: watch::Sender<bool>,
        registry: Arc<Mutex<SessionRegistry>>,
        root: JoinHandle<()>,
    ) -> Self {
        Self {
            shutdown_tx,
            registry,
            root,
        }
    }

    /// Number of currently active poll sessions
    ///
    /// Equals the number of source ids the stagger sequencer has released
    /// so far; it grows to the configured set size and never beyond it.
    pub fn active_sessions(&self) -> usize {
        self.registry.lock().expect("registry mutex poisoned").len()
    }

    /// Signal cancellation without waiting for teardown
    ///
    /// Stops further stagger releases and every session timer; in-flight
    /// invocations are dropped where still cancellable, and a result that
    /// slips past is silently discarded.
    pub fn signal_shutdown(&self) {
        debug!("PipelineHandle: shutdown signalled");
        // Fails only if the pipeline is already gone.
        let _ = self.shutdown_tx.send(true);
    }

    /// Signal cancellation and wait for the pipeline to finish tearing down
    pub async fn shutdown(self) -> Result<()> {
        self.signal_shutdown();
        self.root
            .await
            .map_err(|e| eyre::eyre!("Pipeline root task failed: {e}"))?;

        info!("PipelineHandle: pipeline shut down");
        Ok(())
    }
}
