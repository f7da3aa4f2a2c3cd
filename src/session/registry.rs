//! Process-scoped session registry

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::record::{LoggedEvent, RequestRecord};
use crate::stub::StubStore;
use crate::{Result, StubnetError};

use super::SessionId;

/// Store mapping session ids to per-session stubs and captured logs
///
/// Constructed once per test process (or per test) and passed by
/// reference to the interceptor and client handles. Sessions are never
/// removed; growth is bounded by the process lifetime and the
/// configured limit.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<SessionState>>,
    max_sessions: usize,
    session_count: AtomicUsize,
}

impl SessionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions,
            session_count: AtomicUsize::new(0),
        }
    }

    /// Create a fresh session
    ///
    /// The stub store and both capture logs are inserted together under
    /// one vacant-entry write, so partial session state is never
    /// observable. Token collisions are regenerated away.
    ///
    /// # Errors
    ///
    /// Returns error if the session limit is reached
    pub fn create_session(&self) -> Result<SessionId> {
        // Reserve a slot up front so racing creators cannot overshoot
        // the limit.
        let reserved = self
            .session_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
                (count < self.max_sessions).then_some(count + 1)
            });
        if reserved.is_err() {
            return Err(StubnetError::SessionLimitReached {
                limit: self.max_sessions,
            });
        }

        loop {
            let id = SessionId::generate();
            match self.sessions.entry(id.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(SessionState::new()));
                    debug!("Created session {}", id);
                    return Ok(id);
                }
            }
        }
    }

    /// Look up the state for a session id
    ///
    /// # Errors
    ///
    /// Returns error if the id names no known session
    pub fn session(&self, id: &SessionId) -> Result<Arc<SessionState>> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| StubnetError::ConfigError(format!("unknown session id: {id}")))
    }

    /// Get the number of active sessions
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.session_count.load(Ordering::Relaxed)
    }
}

/// Per-session stub store and capture logs, created atomically together
pub struct SessionState {
    stubs: StubStore,
    requests: Mutex<Vec<RequestRecord>>,
    events: Mutex<Vec<LoggedEvent>>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            stubs: StubStore::new(),
            requests: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// The session's ordered stub collection
    #[must_use]
    pub fn stubs(&self) -> &StubStore {
        &self.stubs
    }

    /// Append an outgoing request snapshot to the capture log
    pub fn record_request(&self, record: RequestRecord) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Append a decision event to the capture log
    pub fn push_event(&self, event: LoggedEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Snapshot of every captured request, in call order
    #[must_use]
    pub fn requests(&self) -> Vec<RequestRecord> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of every logged event, in call order
    #[must_use]
    pub fn events(&self) -> Vec<LoggedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
