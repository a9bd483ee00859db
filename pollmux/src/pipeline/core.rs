//! Pipeline assembly and the root scheduling task

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::{ConfigError, PollConfig};
use crate::domain::QueryResult;
use crate::invoker::QueryInvoker;
use crate::merge::PollStream;
use crate::session::PollSession;
use crate::stagger;

use super::handle::PipelineHandle;
use super::registry::SessionRegistry;

/// The assembled polling pipeline
///
/// Construction validates the configuration; [`start`](Pipeline::start)
/// spawns the root task and hands back the merged output stream plus a
/// handle for shutdown and introspection.
pub struct Pipeline {
    config: PollConfig,
    clock: Arc<dyn Clock>,
    invoker: Arc<dyn QueryInvoker>,
}

impl Pipeline {
    /// Validate the configuration and assemble a pipeline
    ///
    /// Misconfiguration is rejected here, before any polling begins.
    pub fn new(
        config: PollConfig,
        clock: Arc<dyn Clock>,
        invoker: Arc<dyn QueryInvoker>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            invoker,
        })
    }

    /// Start polling
    ///
    /// The root task drives the stagger release; one [`PollSession`] is
    /// spawned per released source id and tracked in the session registry.
    /// The returned handle tears the whole pipeline down: the stagger
    /// release, every session timer, and (best effort) invocations still
    /// in flight.
    pub fn start(self) -> (PollStream, PipelineHandle) {
        let (results_tx, results_rx) = mpsc::channel(self.config.channel_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let registry = Arc::new(Mutex::new(SessionRegistry::default()));

        info!(
            sources = self.config.source_ids.len(),
            padding = ?self.config.padding(),
            repeat_after = ?self.config.repeat_after(),
            "Pipeline: starting"
        );

        let root = tokio::spawn(run_root(
            self.config,
            self.clock,
            self.invoker,
            results_tx,
            shutdown_rx,
            Arc::clone(&registry),
        ));

        let handle = PipelineHandle::new(shutdown_tx, registry, root);
        (PollStream::new(results_rx), handle)
    }
}

/// Root task: drive the stagger release, spawn sessions, park until
/// shutdown, then drain the registry
async fn run_root(
    config: PollConfig,
    clock: Arc<dyn Clock>,
    invoker: Arc<dyn QueryInvoker>,
    results_tx: mpsc::Sender<QueryResult>,
    mut shutdown_rx: watch::Receiver<bool>,
    registry: Arc<Mutex<SessionRegistry>>,
) {
    let repeat_after = config.repeat_after();
    let padding = config.padding();
    let mut releases =
        stagger::release(config.source_ids, padding, Arc::clone(&clock)).enumerate();

    // Separate receiver for the cancellation wait so the `select!` arm's
    // mutable borrow does not conflict with cloning `shutdown_rx` below.
    let mut shutdown_wait = shutdown_rx.clone();

    // Phase 1: release sources until the stagger completes or shutdown.
    loop {
        tokio::select! {
            // Cancellation wins a tie with a due release.
            biased;
            _ = shutdown_wait.wait_for(|stop| *stop) => break,
            release = releases.next() => match release {
                Some((index, source_id)) => {
                    debug!(%source_id, index, "Pipeline: source released, starting session");
                    let session = PollSession::new(
                        source_id.clone(),
                        repeat_after,
                        Arc::clone(&clock),
                        Arc::clone(&invoker),
                        results_tx.clone(),
                        shutdown_rx.clone(),
                    );
                    let handle = tokio::spawn(session.run());
                    registry
                        .lock()
                        .expect("registry mutex poisoned")
                        .insert(index as u64, source_id, handle);
                }
                None => {
                    debug!("Pipeline: stagger complete, full set is polling");
                    break;
                }
            },
        }
    }

    // Phase 2: park until shutdown (no-op if it was already requested).
    let _ = shutdown_rx.wait_for(|stop| *stop).await;

    // Sessions observe the shutdown flag and exit promptly.
    let sessions = registry.lock().expect("registry mutex poisoned").drain();
    debug!(count = sessions.len(), "Pipeline: draining sessions");
    for session in sessions {
        let _ = session.handle.await;
    }

    info!("Pipeline: stopped");
}
