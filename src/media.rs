//! Upload Candidate Validation
//!
//! Gates a selected file before it enters the analysis flow. The gate is a
//! pure predicate over file metadata; loading bytes and guessing mime types
//! are separate conveniences for callers that start from a path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Upload size ceiling enforced by the gate (matches the backend limit).
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024; // 100 MB

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no file provided")]
    MissingFile,
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

/// A candidate upload: the raw bytes plus the metadata the gate and the
/// transport need. Exists only between selection and dispatch.
#[derive(Clone)]
pub struct MediaFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Load a candidate from disk, guessing the mime type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(name, detect_mime(path), bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            name: self.name.clone(),
            size: self.size(),
            mime_type: self.mime_type.clone(),
        }
    }
}

impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// File metadata retained after dispatch, for the status surface and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

/// Guess a mime type from a file extension (octet-stream when unknown).
pub fn detect_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Validate a candidate against type and size policy.
///
/// Pure function of the metadata: no I/O, never panics. Returns a
/// human-readable reason on rejection.
pub fn validate(file: &FileMetadata) -> Result<(), ValidationError> {
    if file.name.trim().is_empty() {
        return Err(ValidationError::MissingFile);
    }
    if !file.mime_type.starts_with("video/") && !file.mime_type.starts_with("image/") {
        return Err(ValidationError::UnsupportedType(file.mime_type.clone()));
    }
    if file.size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size: file.size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}
