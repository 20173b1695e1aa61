//! Session value objects

use crate::domain::shared::error::SessionError;
use crate::domain::shared::value_objects::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No session; the shell offers "Start"
    Idle,
    /// start() is provisioning credential, media and transport
    Connecting,
    /// The data channel reported open
    Active,
}

impl SessionState {
    /// Check if state transition is valid
    pub fn can_transition_to(&self, new_state: &SessionState) -> bool {
        use SessionState::*;

        match (self, new_state) {
            (Idle, Connecting) => true,

            (Connecting, Active) => true,
            (Connecting, Idle) => true,

            (Active, Idle) => true,

            _ => false,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }
}

/// What start() does when a session already exists or is being provisioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartPolicy {
    /// Fail the new start() with `SessionError::Busy`
    #[default]
    Reject,
    /// Wait until the current session returns to Idle, then start
    Queue,
    /// Tear down the current session and start a fresh one
    Replace,
}

/// Snapshot published to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub session_id: Option<SessionId>,
    /// When the current session's start() claimed the slot
    pub started_at: Option<DateTime<Utc>>,
    /// Failure of the most recent start(), cleared by the next one
    pub failure: Option<SessionError>,
}

impl SessionStatus {
    pub fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            session_id: None,
            started_at: None,
            failure: None,
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::idle()
    }
}
