//! Session errors

use crate::domain::session::value_object::SessionState;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The credential service refused or failed to issue a token
    #[error("Credential fetch failed: {0}")]
    Auth(String),

    /// Peer connection, data channel or SDP exchange failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Local capture or audio subsystem failure
    #[error("Media error: {0}")]
    Media(String),

    /// Malformed inbound channel message
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Session already in progress (state: {0:?})")]
    Busy(SessionState),

    /// A newer start() or a stop() took over while this start was in flight
    #[error("Session start superseded")]
    Superseded,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SessionError {
    /// Short tag used by the shell when rendering a failure
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Auth(_) => "auth",
            SessionError::Transport(_) => "transport",
            SessionError::Media(_) => "media",
            SessionError::Parse(_) => "parse",
            SessionError::Busy(_) => "busy",
            SessionError::Superseded => "superseded",
            SessionError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::Auth("401 Unauthorized".to_string());
        assert_eq!(err.to_string(), "Credential fetch failed: 401 Unauthorized");

        let err = SessionError::Busy(SessionState::Active);
        assert_eq!(err.to_string(), "Session already in progress (state: Active)");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(SessionError::Transport("x".into()).kind(), "transport");
        assert_eq!(SessionError::Superseded.kind(), "superseded");
    }
}
