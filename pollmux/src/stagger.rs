//! Staggered release of the configured source set

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream};
use tracing::debug;

use crate::clock::Clock;
use crate::domain::SourceId;

struct ReleaseState {
    remaining: std::vec::IntoIter<SourceId>,
    padding: Duration,
    clock: Arc<dyn Clock>,
    first: bool,
}

/// Emit each source id on its own schedule
///
/// The i-th id (0-indexed) is released `i * padding` after the stream is
/// first polled, so the initial probes are spread out over time instead
/// of bursting at once. The stream is finite: it completes after the last
/// id and performs no further action. An empty set completes immediately.
pub fn release(
    source_ids: Vec<SourceId>,
    padding: Duration,
    clock: Arc<dyn Clock>,
) -> BoxStream<'static, SourceId> {
    let state = ReleaseState {
        remaining: source_ids.into_iter(),
        padding,
        clock,
        first: true,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        let Some(source_id) = state.remaining.next() else {
            return None;
        };

        if state.first {
            state.first = false;
        } else {
            state.clock.after(state.padding).await;
        }

        debug!(%source_id, "stagger: releasing source");
        Some((source_id, state))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use futures::StreamExt;
    use std::sync::Mutex;

    fn sources(ids: &[&str]) -> Vec<SourceId> {
        ids.iter().map(|id| SourceId::from(*id)).collect()
    }

    #[tokio::test]
    async fn test_release_offsets() {
        let clock = VirtualClock::new();
        let released = Arc::new(Mutex::new(Vec::new()));

        let mut stream = release(
            sources(&["a", "b", "c"]),
            Duration::from_millis(500),
            Arc::new(clock.clone()),
        );
        let observer_clock = clock.clone();
        let observed = Arc::clone(&released);
        tokio::spawn(async move {
            while let Some(id) = stream.next().await {
                observed.lock().unwrap().push((id, observer_clock.elapsed()));
            }
        });

        clock.advance(Duration::from_millis(1100)).await;

        let released = released.lock().unwrap();
        assert_eq!(
            *released,
            vec![
                (SourceId::from("a"), Duration::ZERO),
                (SourceId::from("b"), Duration::from_millis(500)),
                (SourceId::from("c"), Duration::from_millis(1000)),
            ]
        );
    }

    #[tokio::test]
    async fn test_release_completes_after_last() {
        let clock = VirtualClock::new();
        let stream = release(
            sources(&["a", "b"]),
            Duration::from_millis(100),
            Arc::new(clock.clone()),
        );

        let collector = tokio::spawn(async move { stream.collect::<Vec<_>>().await });
        clock.advance(Duration::from_millis(200)).await;

        let collected = collector.await.unwrap();
        assert_eq!(collected, sources(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_empty_set_completes_immediately() {
        let clock: Arc<dyn Clock> = Arc::new(VirtualClock::new());
        let mut stream = release(Vec::new(), Duration::from_millis(500), clock);

        // No advance needed at all
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_duplicate_ids_released_twice() {
        let clock = VirtualClock::new();
        let stream = release(
            sources(&["x", "x"]),
            Duration::from_millis(100),
            Arc::new(clock.clone()),
        );

        let collector = tokio::spawn(async move { stream.collect::<Vec<_>>().await });
        clock.advance(Duration::from_millis(100)).await;

        assert_eq!(collector.await.unwrap(), sources(&["x", "x"]));
    }
}
