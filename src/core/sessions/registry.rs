use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::types::SessionState;

/// Shared handle to one session's state.
///
/// Never hold the guard returned by [`SessionHandle::lock`] across an await.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the state.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.lock())
    }
}

/// Owns per-session state with an explicit open/close lifecycle.
///
/// Sessions are never evicted implicitly; callers close them when the
/// conversation ends.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Arc<Mutex<SessionState>>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the session, creating empty state on first access.
    pub fn open(&self, session_id: &str) -> SessionHandle {
        let state = self
            .sessions()
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id, "session opened");
                Arc::new(Mutex::new(SessionState::new(session_id)))
            })
            .clone();
        SessionHandle { state }
    }

    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions()
            .get(session_id)
            .cloned()
            .map(|state| SessionHandle { state })
    }

    /// Drop a session's state. Outstanding handles keep their copy alive.
    pub fn close(&self, session_id: &str) -> bool {
        let removed = self.sessions().remove(session_id).is_some();
        if removed {
            tracing::debug!(session_id, "session closed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }
}
