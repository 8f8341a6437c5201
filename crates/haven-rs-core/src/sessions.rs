//! In-memory session store. Nothing here is persisted.

use crate::error::HavenCoreError;
use chrono::{DateTime, Utc};
use haven_rs_memory::{ConversationState, Turn};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Lightweight listing entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: Uuid,
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    state: ConversationState,
    created_at: DateTime<Utc>,
    turn_lock: Arc<Mutex<()>>,
}

/// One conversation state per session id, shared by clones of the store.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_session(&self) -> Uuid {
        let state = ConversationState::new();
        let id = state.session_id;
        self.sessions.write().insert(
            id,
            SessionEntry {
                state,
                created_at: Utc::now(),
                turn_lock: Arc::new(Mutex::new(())),
            },
        );
        info!("created session (session_id={})", id);
        id
    }

    /// Snapshot of the session's state.
    pub fn get(&self, session_id: Uuid) -> Result<ConversationState, HavenCoreError> {
        self.sessions
            .read()
            .get(&session_id)
            .map(|entry| entry.state.clone())
            .ok_or(HavenCoreError::UnknownSession(session_id))
    }

    /// Exclusive right to take a turn in `session_id`. Hold the guard from
    /// reading the state until the new turn is recorded.
    pub async fn lock_turns(&self, session_id: Uuid) -> Result<OwnedMutexGuard<()>, HavenCoreError> {
        let lock = self
            .sessions
            .read()
            .get(&session_id)
            .map(|entry| entry.turn_lock.clone())
            .ok_or(HavenCoreError::UnknownSession(session_id))?;
        Ok(lock.lock_owned().await)
    }

    pub fn record_turn(&self, session_id: Uuid, turn: Turn) -> Result<(), HavenCoreError> {
        let mut sessions = self.sessions.write();
        let entry = sessions
            .get_mut(&session_id)
            .ok_or(HavenCoreError::UnknownSession(session_id))?;
        debug!(
            "recording turn (session_id={}, user_len={}, response_len={})",
            session_id,
            turn.user.len(),
            turn.response.len()
        );
        entry.state.push(turn);
        Ok(())
    }

    pub fn delete_session(&self, session_id: Uuid) -> bool {
        info!("deleting session (session_id={})", session_id);
        self.sessions.write().remove(&session_id).is_some()
    }

    /// Newest first.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .read()
            .iter()
            .map(|(id, entry)| SessionSummary {
                id: *id,
                turn_count: entry.state.len(),
                created_at: entry.created_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();
        let first = store.create_session();
        let second = store.create_session();

        store
            .record_turn(first, Turn::new("hi", "hello"))
            .expect("record");

        assert_eq!(store.get(first).expect("first").len(), 1);
        assert_eq!(store.get(second).expect("second").len(), 0);
        assert_eq!(store.get(first).expect("first").session_id, first);
        assert_eq!(store.list_sessions().len(), 2);
    }

    #[test]
    fn deleted_session_is_unknown() {
        let store = SessionStore::new();
        let id = store.create_session();
        assert!(store.delete_session(id));
        assert!(!store.delete_session(id));
        match store.get(id) {
            Err(HavenCoreError::UnknownSession(missing)) => assert_eq!(missing, id),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            store.record_turn(id, Turn::new("a", "b")),
            Err(HavenCoreError::UnknownSession(_))
        ));
    }
}
