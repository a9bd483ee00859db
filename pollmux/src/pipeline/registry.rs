//! Registry of active poll sessions

use std::collections::HashMap;

use tokio::task::JoinHandle;

use crate::domain::SourceId;

/// One entry per session released by the stagger sequencer
///
/// Keyed by release index rather than source id, so a duplicated id keeps
/// a separate session per occurrence. Entries are added as the sequencer
/// releases ids and drained on cancellation.
#[derive(Default)]
pub(crate) struct SessionRegistry {
    sessions: HashMap<u64, RegisteredSession>,
}

pub(crate) struct RegisteredSession {
    pub source_id: SourceId,
    pub handle: JoinHandle<()>,
}

impl SessionRegistry {
    pub fn insert(&mut self, release_index: u64, source_id: SourceId, handle: JoinHandle<()>) {
        self.sessions
            .insert(release_index, RegisteredSession { source_id, handle });
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn drain(&mut self) -> Vec<RegisteredSession> {
        self.sessions.drain().map(|(_, session)| session).collect()
    }
}
