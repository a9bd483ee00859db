//! Manually advanced clock for deterministic tests

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{self, BoxFuture};
use futures::stream::{self, BoxStream};
use tokio::sync::oneshot;
use tokio::task;
use tracing::trace;

use super::Clock;

/// Times `advance` yields to the runtime after firing a waiter, so woken
/// tasks can run and register follow-up timers before time moves past them
const WAKE_YIELDS: usize = 4;

/// Virtual clock holding a logical current time
///
/// `after` and `every` register waiters on a heap; nothing fires until
/// [`advance`](VirtualClock::advance) moves time forward. Waiters due at
/// the same instant fire in issuance order, which keeps runs on a
/// current-thread runtime fully deterministic.
#[derive(Clone, Default)]
pub struct VirtualClock {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    now: Duration,
    next_seq: u64,
    waiters: BinaryHeap<Waiter>,
}

struct Waiter {
    deadline: Duration,
    seq: u64,
    tx: oneshot::Sender<()>,
}

// BinaryHeap is a max-heap; invert the ordering so the earliest deadline
// (then the earliest issuance) pops first.
impl Ord for Waiter {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.deadline, other.seq).cmp(&(self.deadline, self.seq))
    }
}

impl PartialOrd for Waiter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Waiter {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Waiter {}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        self.inner.lock().expect("clock mutex poisoned").now
    }

    /// Number of registered waiters that have not fired yet
    pub fn pending(&self) -> usize {
        self.inner.lock().expect("clock mutex poisoned").waiters.len()
    }

    /// Advance logical time by `delta`, firing every waiter that falls due
    ///
    /// Waiters fire in timestamp order, ties broken by issuance order. The
    /// clock yields to the runtime before processing and after each fired
    /// waiter, so tasks woken mid-advance get to run and register their
    /// follow-up timers inside the same window.
    pub async fn advance(&self, delta: Duration) {
        let target = self.elapsed() + delta;
        trace!(?delta, ?target, "VirtualClock: advancing");

        // Let tasks spawned before this call reach their first await and
        // register their timers.
        Self::settle().await;

        loop {
            let due = {
                let mut inner = self.inner.lock().expect("clock mutex poisoned");
                match inner.waiters.peek() {
                    Some(waiter) if waiter.deadline <= target => {
                        let waiter = inner.waiters.pop().expect("peeked waiter");
                        inner.now = waiter.deadline;
                        Some(waiter)
                    }
                    _ => None,
                }
            };

            let Some(waiter) = due else { break };
            trace!(deadline = ?waiter.deadline, seq = waiter.seq, "VirtualClock: firing waiter");
            // The receiver may be gone if its task was dropped; that is fine.
            let _ = waiter.tx.send(());
            Self::settle().await;
        }

        self.inner.lock().expect("clock mutex poisoned").now = target;
    }

    async fn settle() {
        for _ in 0..WAKE_YIELDS {
            task::yield_now().await;
        }
    }
}

impl Clock for VirtualClock {
    fn after(&self, delay: Duration) -> BoxFuture<'static, ()> {
        if delay.is_zero() {
            return Box::pin(future::ready(()));
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut inner = self.inner.lock().expect("clock mutex poisoned");
            let deadline = inner.now + delay;
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.waiters.push(Waiter { deadline, seq, tx });
        }

        Box::pin(async move {
            if rx.await.is_err() {
                // The clock was dropped with this waiter still registered;
                // it can never fire now.
                future::pending::<()>().await;
            }
        })
    }

    fn every(&self, period: Duration) -> BoxStream<'static, ()> {
        let clock = self.clone();
        Box::pin(stream::unfold(clock, move |clock| async move {
            clock.after(period).await;
            Some(((), clock))
        }))
    }
}
