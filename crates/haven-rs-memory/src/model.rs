//! Conversation turn and state models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// What the user said.
    pub user: String,
    /// What the agent answered.
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn new(user: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            response: response.into(),
            created_at: Utc::now(),
        }
    }
}

/// Ordered turns of a single session. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    pub session_id: Uuid,
    turns: Vec<Turn>,
}

impl ConversationState {
    /// Empty state with a fresh session id.
    pub fn new() -> Self {
        Self::with_session_id(Uuid::new_v4())
    }

    pub fn with_session_id(session_id: Uuid) -> Self {
        Self {
            session_id,
            turns: Vec::new(),
        }
    }

    /// Append a turn. Earlier turns are never touched.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Turns in chronological order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn push_appends_in_order() {
        let mut state = ConversationState::new();
        state.push(Turn::new("hi", "hello"));
        state.push(Turn::new("how are you", "fine"));
        assert_eq!(state.len(), 2);
        assert_eq!(state.turns()[0].user, "hi");
        assert_eq!(state.last().map(|turn| turn.response.as_str()), Some("fine"));
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = ConversationState::new();
        state.push(Turn::new("hi", "hello"));
        let json = serde_json::to_string(&state).expect("serialize");
        let decoded: ConversationState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, state);
    }
}
