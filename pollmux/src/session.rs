//! Per-source polling session

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::clock::Clock;
use crate::domain::{QueryResult, SourceId};
use crate::invoker::QueryInvoker;

/// The unbounded timer+query loop for one source
///
/// On activation the session issues one invocation immediately, then one
/// per `repeat_after` tick, forever. Triggers are driven purely by
/// elapsed time: every invocation runs as its own task, so a slow or
/// stalled query never delays the next scheduled trigger, and several
/// invocations for the same source may be in flight at once.
///
/// A session never terminates on its own; it stops when the pipeline's
/// shutdown flag flips (or its channel closes).
pub struct PollSession {
    source_id: SourceId,
    repeat_after: Duration,
    clock: Arc<dyn Clock>,
    invoker: Arc<dyn QueryInvoker>,
    results_tx: mpsc::Sender<QueryResult>,
    shutdown_rx: watch::Receiver<bool>,
}

impl PollSession {
    pub fn new(
        source_id: SourceId,
        repeat_after: Duration,
        clock: Arc<dyn Clock>,
        invoker: Arc<dyn QueryInvoker>,
        results_tx: mpsc::Sender<QueryResult>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            source_id,
            repeat_after,
            clock,
            invoker,
            results_tx,
            shutdown_rx,
        }
    }

    /// Run the session until pipeline shutdown
    pub async fn run(self) {
        debug!(
            source_id = %self.source_id,
            repeat_after = ?self.repeat_after,
            "PollSession: started"
        );

        // The first query goes out with zero delay.
        self.dispatch();

        let mut ticks = self.clock.every(self.repeat_after);
        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            tokio::select! {
                // Cancellation wins a tie with a due tick.
                biased;
                _ = shutdown_rx.wait_for(|stop| *stop) => {
                    debug!(source_id = %self.source_id, "PollSession: shutdown");
                    break;
                }
                _ = ticks.next() => self.dispatch(),
            }
        }
    }

    /// Launch one invocation as its own task
    ///
    /// The result flows into the merged stream whenever the invocation
    /// completes, interleaved with results from any other invocation.
    fn dispatch(&self) {
        debug!(source_id = %self.source_id, "PollSession: dispatching query");

        let source_id = self.source_id.clone();
        let invoker = Arc::clone(&self.invoker);
        let results_tx = self.results_tx.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                // Best effort: drop the invocation if the pipeline is torn
                // down while it is still in flight.
                _ = shutdown_rx.wait_for(|stop| *stop) => return,
                outcome = invoker.invoke(&source_id) => outcome,
            };

            let result = match outcome {
                Ok(payload) => QueryResult::success(source_id, payload),
                Err(error) => {
                    debug!(error = %error, "PollSession: query failed");
                    QueryResult::failure(source_id, error)
                }
            };

            // The receiver may already be gone during teardown.
            if results_tx.send(result).await.is_err() {
                debug!("PollSession: output stream closed, result dropped");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use crate::invoker::mock::CountingInvoker;
    use crate::invoker::{FnInvoker, QueryError};

    struct SessionUnderTest {
        clock: VirtualClock,
        results_rx: mpsc::Receiver<QueryResult>,
        shutdown_tx: watch::Sender<bool>,
    }

    fn start_session(invoker: Arc<dyn QueryInvoker>, repeat_after: Duration) -> SessionUnderTest {
        let clock = VirtualClock::new();
        let (results_tx, results_rx) = mpsc::channel(64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let session = PollSession::new(
            SourceId::new("s"),
            repeat_after,
            Arc::new(clock.clone()),
            invoker,
            results_tx,
            shutdown_rx,
        );
        tokio::spawn(session.run());

        SessionUnderTest {
            clock,
            results_rx,
            shutdown_tx,
        }
    }

    #[tokio::test]
    async fn test_first_invocation_is_immediate() {
        let invoker = Arc::new(CountingInvoker::new());
        let mut test = start_session(invoker.clone(), Duration::from_secs(10));

        // No time has passed at all
        test.clock.advance(Duration::ZERO).await;

        assert_eq!(invoker.calls(), 1);
        assert!(test.results_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_triggers_spaced_by_repeat_after() {
        let invoker = Arc::new(CountingInvoker::new());
        let test = start_session(invoker.clone(), Duration::from_secs(10));

        test.clock.advance(Duration::from_secs(9)).await;
        assert_eq!(invoker.calls(), 1);

        test.clock.advance(Duration::from_secs(1)).await;
        assert_eq!(invoker.calls(), 2);

        test.clock.advance(Duration::from_secs(10)).await;
        assert_eq!(invoker.calls(), 3);
    }

    #[tokio::test]
    async fn test_stalled_query_does_not_delay_triggers() {
        // Invocations never complete, yet the timer keeps firing
        let invoker = Arc::new(CountingInvoker::stalled());
        let test = start_session(invoker.clone(), Duration::from_secs(5));

        test.clock.advance(Duration::from_secs(15)).await;

        // 1 immediate + 3 repeats, all concurrently in flight
        assert_eq!(invoker.calls(), 4);
    }

    #[tokio::test]
    async fn test_failure_is_forwarded_and_loop_continues() {
        let invoker = Arc::new(FnInvoker::new(|_: &SourceId| {
            Err(QueryError::backend("down"))
        }));
        let mut test = start_session(invoker, Duration::from_secs(5));

        test.clock.advance(Duration::from_secs(5)).await;

        let first = test.results_rx.try_recv().unwrap();
        let second = test.results_rx.try_recv().unwrap();
        assert!(!first.is_success());
        assert!(!second.is_success());
    }

    #[tokio::test]
    async fn test_shutdown_stops_triggers() {
        let invoker = Arc::new(CountingInvoker::new());
        let test = start_session(invoker.clone(), Duration::from_secs(5));

        test.clock.advance(Duration::from_secs(5)).await;
        assert_eq!(invoker.calls(), 2);

        test.shutdown_tx.send(true).unwrap();
        test.clock.advance(Duration::from_secs(20)).await;

        // No trigger after the cancellation instant
        assert_eq!(invoker.calls(), 2);
    }
}
