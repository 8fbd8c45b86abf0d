//! Transcript Export
//!
//! Serializes a conversation snapshot plus session identity and file
//! metadata into the single persisted artifact the core produces: a JSON
//! document offered to the user as a download.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::media::FileMetadata;
use crate::session::{validate_session_id, Session, SessionError};
use crate::store::{Author, ChatEntry};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// One transcript line in the export document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedMessage {
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<&ChatEntry> for ExportedMessage {
    fn from(entry: &ChatEntry) -> Self {
        Self {
            text: entry.text.clone(),
            is_user: entry.author == Author::User,
            timestamp: entry.timestamp,
        }
    }
}

/// The export document: session id, generation time, every transcript line,
/// and the analyzed file's metadata when one was dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExport {
    pub session_id: String,
    pub generated_at: DateTime<Utc>,
    pub messages: Vec<ExportedMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_metadata: Option<FileMetadata>,
}

impl ChatExport {
    pub fn new(
        session: &Session,
        entries: &[ChatEntry],
        file_metadata: Option<FileMetadata>,
    ) -> Self {
        Self {
            session_id: session.id.clone(),
            generated_at: Utc::now(),
            messages: entries.iter().map(ExportedMessage::from).collect(),
            file_metadata,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Download file name for this export. The session id is validated so it
    /// cannot smuggle path separators into the name.
    pub fn file_name(&self) -> Result<String, ExportError> {
        validate_session_id(&self.session_id)?;
        Ok(format!("chat-history-{}.json", self.session_id))
    }

    /// Write the document into `dir`, atomically (tmp sibling then rename).
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(self.file_name()?);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, self.to_json()?)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }
}

/// Default directory for exported transcripts: the user's download
/// directory, falling back to the working directory.
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}
