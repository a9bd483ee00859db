//! Merged output stream

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::domain::QueryResult;

/// Default capacity of the merged result channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Unified stream of results from every poll session
///
/// Elements appear strictly in invocation-completion order; the merger
/// imposes no ordering of its own, so results from queries issued at
/// different times may arrive in either order. Failures are ordinary
/// elements. The stream ends only once the pipeline has been shut down
/// and every buffered result has been drained.
pub struct PollStream {
    rx: mpsc::Receiver<QueryResult>,
}

impl PollStream {
    pub(crate) fn new(rx: mpsc::Receiver<QueryResult>) -> Self {
        Self { rx }
    }

    /// Receive the next merged result
    ///
    /// Returns `None` once the pipeline is gone and the buffer is empty.
    pub async fn recv(&mut self) -> Option<QueryResult> {
        self.rx.recv().await
    }

    /// Receive a result that is already buffered, without waiting
    pub fn try_recv(&mut self) -> Option<QueryResult> {
        self.rx.try_recv().ok()
    }

    /// Collect the next `n` results (bounded observation)
    ///
    /// Stops early if the stream ends first.
    pub async fn take(&mut self, n: usize) -> Vec<QueryResult> {
        let mut results = Vec::with_capacity(n);
        while results.len() < n {
            match self.rx.recv().await {
                Some(result) => results.push(result),
                None => break,
            }
        }
        results
    }
}

impl Stream for PollStream {
    type Item = QueryResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
