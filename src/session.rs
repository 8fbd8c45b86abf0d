use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid session ID")]
    InvalidSessionId,
}

/// Generate a fresh session identifier.
///
/// A ULID carries a millisecond timestamp prefix followed by random bits, so
/// ids sort by creation time and collide only with negligible probability
/// within a process lifetime. Uniqueness is best-effort, not cryptographic.
pub fn new_session_id() -> String {
    format!("session_{}", Ulid::new())
}

/// Last 8 characters of a session id, for compact status display.
pub fn short_id(session_id: &str) -> &str {
    let len = session_id.chars().count();
    if len <= 8 {
        session_id
    } else {
        let (idx, _) = session_id.char_indices().nth(len - 8).unwrap_or((0, ' '));
        &session_id[idx..]
    }
}

/// Validate that a session ID contains only safe characters (alphanumeric, dash, underscore).
/// Rejects any path traversal attempts (/, \, ..) before the id is embedded in a filename.
pub fn validate_session_id(session_id: &str) -> Result<(), SessionError> {
    if session_id.is_empty() {
        return Err(SessionError::InvalidSessionId);
    }
    if session_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(SessionError::InvalidSessionId)
    }
}

/// The identity correlating one continuous conversation (one upload plus its
/// follow-ups) with the backend. Created whole, replaced whole on reset,
/// never mutated in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: new_session_id(),
            created_at: Utc::now(),
        }
    }

    /// Truncated id for the status bar.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
