//! Time abstraction for the scheduler
//!
//! Production code only ever sees the [`Clock`] trait; tests substitute
//! the [`VirtualClock`] and advance it deterministically, so timing
//! behavior is verifiable without real wall-clock waits.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::BoxStream;

mod manual;
mod system;

pub use manual::VirtualClock;
pub use system::SystemClock;

/// Scheduling primitives for delayed and periodic events
///
/// The two implementations must be behaviorally substitutable: code that
/// is correct against the trait is correct under either clock.
pub trait Clock: Send + Sync {
    /// Single event that completes once `delay` has elapsed
    ///
    /// `after(Duration::ZERO)` completes immediately.
    fn after(&self, delay: Duration) -> BoxFuture<'static, ()>;

    /// Lazy, infinite tick stream spaced by `period`
    ///
    /// The first tick lands at `period`, not at time zero.
    fn every(&self, period: Duration) -> BoxStream<'static, ()>;
}
