//! Wall-clock implementation on tokio timers

use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};

use super::Clock;

/// Real clock backed by the tokio timer wheel
///
/// Non-blocking and safe to share across sessions; every `after`/`every`
/// call schedules independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn after(&self, delay: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(delay))
    }

    fn every(&self, period: Duration) -> BoxStream<'static, ()> {
        // interval_at keeps ticks on a fixed schedule and puts the first
        // one at `period` instead of firing immediately.
        let start = tokio::time::Instant::now() + period;
        let interval = tokio::time::interval_at(start, period);
        Box::pin(stream::unfold(interval, |mut interval| async move {
            interval.tick().await;
            Some(((), interval))
        }))
    }
}
