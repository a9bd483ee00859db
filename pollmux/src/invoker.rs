//! Query invoker contract consumed by the scheduler

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::SourceId;

/// Errors an invocation can complete with
///
/// These surface through the merged stream as failure-kind results; the
/// scheduler neither retries nor times out on the invoker's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The backend reported an error for this source
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend answered with something the invoker could not use
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl QueryError {
    /// Build a backend error from any message
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Asynchronous query operation against one source
///
/// This is the seam between the scheduler and whatever actually performs
/// a query (HTTP call, database read, device probe). Invocation latency
/// and failure are opaque to the scheduler; multiple invocations for the
/// same source may be in flight concurrently.
#[async_trait]
pub trait QueryInvoker: Send + Sync {
    /// Query one source, yielding its payload or an error
    async fn invoke(&self, source_id: &SourceId) -> Result<String, QueryError>;
}

/// Adapter turning a plain deterministic function into a [`QueryInvoker`]
///
/// The function completes with zero latency. Backends with real latency
/// or cancellation needs should implement [`QueryInvoker`] directly.
pub struct FnInvoker<F> {
    query: F,
}

impl<F> FnInvoker<F>
where
    F: Fn(&SourceId) -> Result<String, QueryError> + Send + Sync,
{
    pub fn new(query: F) -> Self {
        Self { query }
    }
}

#[async_trait]
impl<F> QueryInvoker for FnInvoker<F>
where
    F: Fn(&SourceId) -> Result<String, QueryError> + Send + Sync,
{
    async fn invoke(&self, source_id: &SourceId) -> Result<String, QueryError> {
        (self.query)(source_id)
    }
}
