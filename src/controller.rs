//! Session Controller
//!
//! The state machine tying session identity, the file gate, the transport
//! and the transcript together. Accepts user intents (upload, send, reset,
//! export), drives the backend calls, and is the only writer of session
//! status and message history.
//!
//! Intents are processed serially up to the transport boundary: the
//! synchronous portion of each intent runs under the state lock, and while
//! a remote call is outstanding the machine sits in an `Awaiting*` phase
//! and ignores new upload/send intents. That guard is the sole form of
//! backpressure; there is no intent queue. A reset during an in-flight call
//! swaps the live session, and the completion continuation re-checks the
//! originating session id before touching the store, so late responses for
//! a superseded session are dropped on arrival.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::export::ChatExport;
use crate::media::{self, FileMetadata, MediaFile};
use crate::session::Session;
use crate::store::{ChatEntry, ConversationStore, ErrorKind};
use crate::transport::Transport;

/// Text of the availability warning appended when the startup probe fails.
pub const OFFLINE_MESSAGE: &str =
    "Cannot connect to server. Please check if the backend is running.";

/// Where the machine currently is in the upload → analyze → converse flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No analysis dispatched yet; awaiting an upload.
    Idle,
    /// Upload dispatched, analysis response pending.
    AwaitingAnalysis,
    /// Analysis complete; follow-ups allowed, nothing pending.
    Conversing,
    /// Follow-up dispatched, response pending.
    AwaitingReply,
}

/// Everything the controller owns, behind one lock. No other component
/// reads or writes the session or the store directly.
struct Inner {
    session: Session,
    store: ConversationStore,
    phase: Phase,
    server_online: bool,
    current_file: Option<FileMetadata>,
    last_analysis: Option<String>,
}

impl Inner {
    fn fresh() -> Self {
        Self {
            session: Session::new(),
            store: ConversationStore::new(),
            phase: Phase::Idle,
            server_online: true,
            current_file: None,
            last_analysis: None,
        }
    }
}

/// Status surface exposed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerStatus {
    pub session_id: String,
    pub short_session_id: String,
    pub is_processing: bool,
    pub is_bot_loading: bool,
    pub is_server_online: bool,
    pub message_count: usize,
}

#[derive(Clone)]
pub struct SessionController {
    inner: Arc<RwLock<Inner>>,
    transport: Arc<dyn Transport>,
}

impl SessionController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let controller = Self {
            inner: Arc::new(RwLock::new(Inner::fresh())),
            transport,
        };
        info!(session = %controller.session_id(), "session created");
        controller
    }

    /// Startup side effect: probe the backend once and surface an outage as
    /// an informational error entry. Never blocks later sends.
    pub async fn init(&self) {
        self.probe_health().await;
    }

    /// Upload intent: gate the file, append the prompt as a user entry,
    /// dispatch the analysis call, then append the bot or error entry when
    /// this specific response resolves. Accepted only while idle.
    pub async fn upload(&self, file: MediaFile, prompt: &str) {
        let prompt = prompt.trim();
        let session_id = {
            let mut inner = self.inner.write();
            if inner.phase != Phase::Idle {
                debug!(phase = ?inner.phase, "upload ignored: request already in flight");
                return;
            }
            if prompt.is_empty() {
                debug!("upload ignored: blank prompt");
                return;
            }
            if let Err(e) = media::validate(&file.metadata()) {
                warn!(file = %file.name, error = %e, "upload rejected by file gate");
                inner.store.append(ChatEntry::error(
                    ErrorKind::Validation,
                    format!("File validation failed: {e}"),
                ));
                return;
            }
            inner.current_file = Some(file.metadata());
            inner.store.append(ChatEntry::user(prompt));
            inner.phase = Phase::AwaitingAnalysis;
            inner.session.id.clone()
        };

        info!(session = %session_id, file = %file.name, "dispatching analysis");
        let result = self
            .transport
            .send_message(prompt, Some(&file), &session_id)
            .await;

        let mut inner = self.inner.write();
        if inner.session.id != session_id {
            debug!(session = %session_id, "discarding analysis response for superseded session");
            return;
        }
        match result {
            Ok(response) => {
                inner.last_analysis = Some(response.clone());
                inner.store.append(ChatEntry::bot(response));
                inner.phase = Phase::Conversing;
            }
            Err(e) => {
                warn!(session = %session_id, error = %e, "analysis failed");
                inner.store.append(ChatEntry::error(
                    ErrorKind::Transport,
                    format!("Upload failed: {e}"),
                ));
                inner.phase = Phase::Idle;
            }
        }
    }

    /// Follow-up intent: text-only continuation of the live session.
    /// Accepted only while conversing; blank text is a no-op.
    pub async fn send(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let session_id = {
            let mut inner = self.inner.write();
            if inner.phase != Phase::Conversing {
                debug!(phase = ?inner.phase, "send ignored: not conversing");
                return;
            }
            inner.store.append(ChatEntry::user(text));
            inner.phase = Phase::AwaitingReply;
            inner.session.id.clone()
        };

        debug!(session = %session_id, "dispatching follow-up");
        let result = self.transport.send_message(text, None, &session_id).await;

        let mut inner = self.inner.write();
        if inner.session.id != session_id {
            debug!(session = %session_id, "discarding reply for superseded session");
            return;
        }
        match result {
            Ok(response) => {
                inner.store.append(ChatEntry::bot(response));
            }
            Err(e) => {
                warn!(session = %session_id, error = %e, "follow-up failed");
                inner.store.append(ChatEntry::error(
                    ErrorKind::Transport,
                    format!("Message failed: {e}"),
                ));
            }
        }
        // Usable either way; a failed turn may be retried manually.
        inner.phase = Phase::Conversing;
    }

    /// Reset intent: replace the session wholesale and reseed the
    /// transcript, from any state including mid-flight. The health probe
    /// runs again for the new session.
    pub async fn reset(&self) {
        let new_id = {
            let mut inner = self.inner.write();
            inner.session = Session::new();
            inner.store.reset(ChatEntry::welcome());
            inner.phase = Phase::Idle;
            inner.current_file = None;
            inner.last_analysis = None;
            inner.session.id.clone()
        };
        info!(session = %new_id, "session reset");
        self.probe_health().await;
    }

    /// Export intent: pure read. `None` until the transcript holds more
    /// than the seed entry.
    pub fn export(&self) -> Option<ChatExport> {
        let inner = self.inner.read();
        if inner.store.len() <= 1 {
            return None;
        }
        Some(ChatExport::new(
            &inner.session,
            inner.store.entries(),
            inner.current_file.clone(),
        ))
    }

    pub fn status(&self) -> ControllerStatus {
        let inner = self.inner.read();
        ControllerStatus {
            session_id: inner.session.id.clone(),
            short_session_id: inner.session.short_id().to_string(),
            is_processing: inner.phase == Phase::AwaitingAnalysis,
            is_bot_loading: inner.phase == Phase::AwaitingReply,
            is_server_online: inner.server_online,
            message_count: inner.store.len(),
        }
    }

    /// Ordered transcript snapshot.
    pub fn messages(&self) -> Vec<ChatEntry> {
        self.inner.read().store.snapshot()
    }

    pub fn session_id(&self) -> String {
        self.inner.read().session.id.clone()
    }

    pub fn is_server_online(&self) -> bool {
        self.inner.read().server_online
    }

    /// Metadata of the dispatched upload, if any (cleared on reset).
    pub fn current_file(&self) -> Option<FileMetadata> {
        self.inner.read().current_file.clone()
    }

    /// Response text of the analysis turn, retained for display-only reuse.
    pub fn last_analysis(&self) -> Option<String> {
        self.inner.read().last_analysis.clone()
    }

    async fn probe_health(&self) {
        let online = self.transport.check_health().await;
        let mut inner = self.inner.write();
        inner.server_online = online;
        if !online {
            warn!("backend unreachable at startup probe");
            inner
                .store
                .append(ChatEntry::error(ErrorKind::Availability, OFFLINE_MESSAGE));
        }
    }
}
