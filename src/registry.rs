//! Registry of live match sessions.

use crate::protocol::{MatchId, PlayerId};
use crate::recorder::MatchRecorder;
use crate::session::MatchSession;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// A session shared between the registry and connection tasks.
pub type SharedSession = Arc<Mutex<MatchSession>>;

/// Locks a shared session, recovering the data if a holder panicked.
pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, MatchSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Maps match ids to sessions. Cloning yields another handle to the same map.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<MatchId, SharedSession>>>,
    recorder: Arc<dyn MatchRecorder>,
}

impl SessionRegistry {
    /// Creates an empty registry whose sessions report to `recorder`.
    #[instrument(skip(recorder))]
    pub fn new(recorder: Arc<dyn MatchRecorder>) -> Self {
        info!("Creating session registry");
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            recorder,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<MatchId, SharedSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a session for `match_id`, or returns the existing one untouched.
    #[instrument(skip(self))]
    pub fn create(&self, match_id: MatchId, white: PlayerId, black: PlayerId) -> SharedSession {
        let mut sessions = self.sessions();
        if let Some(existing) = sessions.get(&match_id) {
            debug!("Session already exists");
            return existing.clone();
        }

        let session = Arc::new(Mutex::new(MatchSession::new(
            match_id.clone(),
            white,
            black,
            self.recorder.clone(),
        )));
        sessions.insert(match_id, session.clone());
        info!(count = sessions.len(), "Registered session");
        session
    }

    /// Looks up a session.
    pub fn get(&self, match_id: &str) -> Option<SharedSession> {
        let session = self.sessions().get(match_id).cloned();
        if session.is_none() {
            debug!(match_id, "Session not found");
        }
        session
    }

    /// Whether a session exists.
    pub fn has(&self, match_id: &str) -> bool {
        self.sessions().contains_key(match_id)
    }

    /// Removes a session. Returns whether it existed.
    #[instrument(skip(self))]
    pub fn delete(&self, match_id: &str) -> bool {
        let removed = self.sessions().remove(match_id).is_some();
        if removed {
            info!("Session deleted");
        }
        removed
    }

    /// Ids of all live sessions, sorted.
    pub fn list_ids(&self) -> Vec<MatchId> {
        let mut ids: Vec<_> = self.sessions().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    /// Deletes every session with no bound connection. Returns the removed ids.
    #[instrument(skip(self))]
    pub fn cleanup(&self) -> Vec<MatchId> {
        let mut sessions = self.sessions();
        let idle: Vec<MatchId> = sessions
            .iter()
            .filter(|(_, session)| lock_session(session).connection_count() == 0)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &idle {
            sessions.remove(id);
        }
        info!(removed = idle.len(), remaining = sessions.len(), "Cleanup sweep finished");
        idle
    }

    /// Runs [`cleanup`](Self::cleanup) every `interval` on the current runtime.
    ///
    /// The first sweep happens one full interval after the call.
    pub fn spawn_cleanup(&self, interval: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                registry.cleanup();
            }
        })
    }
}
