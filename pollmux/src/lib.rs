//! Pollmux - staggered repeating poll scheduler
//!
//! Pollmux polls a fixed set of sources forever. Initial queries are
//! staggered (spread out by a fixed padding) to avoid a burst of
//! simultaneous requests; after that, each source is re-queried at a
//! regular interval. Results arrive asynchronously, possibly out of
//! order, and are merged into one unified output stream.
//!
//! # Core Concepts
//!
//! - **Time Behind a Trait**: production code only sees [`Clock`]; tests
//!   substitute the [`VirtualClock`] and advance it deterministically
//! - **Triggers Beat Completions**: a slow query never delays the next
//!   scheduled poll; invocations run as independent tasks
//! - **Failures Are Data**: a failed invocation is an ordinary element of
//!   the merged stream, never a stream-ending error
//! - **One Switch Tears It Down**: a single shutdown signal stops the
//!   stagger release, every session timer, and in-flight invocations
//!
//! # Modules
//!
//! - [`clock`] - Clock trait with real and virtual implementations
//! - [`config`] - Configuration types and validation
//! - [`domain`] - SourceId and QueryResult types
//! - [`invoker`] - Query invoker trait consumed by the scheduler
//! - [`stagger`] - Staggered release of the source set
//! - [`session`] - The unbounded per-source timer+query loop
//! - [`merge`] - The merged output stream
//! - [`pipeline`] - Wiring and lifecycle management

pub mod cli;
pub mod clock;
pub mod config;
pub mod domain;
pub mod invoker;
pub mod merge;
pub mod pipeline;
pub mod session;
pub mod stagger;

// Re-export commonly used types
pub use clock::{Clock, SystemClock, VirtualClock};
pub use config::{ConfigError, DEFAULT_SAFETY_MARGIN, PollConfig};
pub use domain::{QueryResult, SourceId};
pub use invoker::{FnInvoker, QueryError, QueryInvoker};
pub use merge::{DEFAULT_CHANNEL_CAPACITY, PollStream};
pub use pipeline::{Pipeline, PipelineHandle};
pub use session::PollSession;
