// StreamSight Core Library
// Exports the session orchestration core for use by the CLI shell and tests

pub mod controller;
pub mod export;
pub mod media;
pub mod session;
pub mod store;
pub mod transport;

// Re-export commonly used types for the shell
pub use controller::{ControllerStatus, SessionController, OFFLINE_MESSAGE};
pub use export::{default_export_dir, ChatExport, ExportError, ExportedMessage};
pub use media::{detect_mime, validate, FileMetadata, MediaFile, ValidationError, MAX_UPLOAD_BYTES};
pub use session::{new_session_id, short_id, validate_session_id, Session, SessionError};
pub use store::{Author, ChatEntry, ConversationStore, ErrorKind, WELCOME_MESSAGE};
pub use transport::{HttpTransport, Transport, TransportError};
