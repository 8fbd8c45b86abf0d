//! Conversation Transcript
//!
//! Append-only ordered log of chat entries. The source of truth for the
//! displayed transcript: entries are immutable once appended, insertion
//! order is display order, and only a full reset replaces the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seed entry present after every initialization and reset.
pub const WELCOME_MESSAGE: &str = "Welcome! Please upload a video to begin the analysis.";

/// Who produced a chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Bot,
}

/// Classification of an error entry, left to the presentation layer to
/// render (prefixes, icons, colors). The core stores kind + message only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// File gate rejection; recovered locally.
    Validation,
    /// Network failure, non-success response, or unparsable payload.
    Transport,
    /// Startup health probe failure; informational, blocks nothing.
    Availability,
}

/// One line of the transcript (user, bot, or error).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub text: String,
    pub author: Author,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: Author::User,
            timestamp: Utc::now(),
            is_error: false,
            error_kind: None,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: Author::Bot,
            timestamp: Utc::now(),
            is_error: false,
            error_kind: None,
        }
    }

    pub fn error(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: Author::Bot,
            timestamp: Utc::now(),
            is_error: true,
            error_kind: Some(kind),
        }
    }

    pub fn welcome() -> Self {
        Self::bot(WELCOME_MESSAGE)
    }
}

/// Append-only log of chat entries, seeded with the welcome entry.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    entries: Vec<ChatEntry>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            entries: vec![ChatEntry::welcome()],
        }
    }

    pub fn append(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    /// Ordered read-only view of the transcript.
    pub fn snapshot(&self) -> Vec<ChatEntry> {
        self.entries.clone()
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Atomically replace the whole log with a single fresh entry.
    pub fn reset(&mut self, initial: ChatEntry) {
        self.entries = vec![initial];
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_seeds_welcome() {
        let store = ConversationStore::new();
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].text, WELCOME_MESSAGE);
        assert_eq!(store.entries()[0].author, Author::Bot);
        assert!(!store.entries()[0].is_error);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut store = ConversationStore::new();
        store.append(ChatEntry::user("first"));
        store.append(ChatEntry::bot("second"));
        store.append(ChatEntry::error(ErrorKind::Transport, "third"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot[1].text, "first");
        assert_eq!(snapshot[2].text, "second");
        assert_eq!(snapshot[3].text, "third");
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let mut store = ConversationStore::new();
        for i in 0..16 {
            store.append(ChatEntry::user(format!("msg {i}")));
        }
        let snapshot = store.snapshot();
        for pair in snapshot.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_reset_replaces_log() {
        let mut store = ConversationStore::new();
        store.append(ChatEntry::user("hello"));
        store.append(ChatEntry::bot("hi"));
        store.reset(ChatEntry::welcome());
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].text, WELCOME_MESSAGE);
    }

    #[test]
    fn test_error_entry_carries_kind() {
        let entry = ChatEntry::error(ErrorKind::Validation, "unsupported file type: application/pdf");
        assert!(entry.is_error);
        assert_eq!(entry.error_kind, Some(ErrorKind::Validation));
        assert_eq!(entry.author, Author::Bot);
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = ChatEntry::error(ErrorKind::Transport, "boom");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["errorKind"], "transport");
        assert!(json.get("error_kind").is_none());
    }
}
