//! Backend Transport
//!
//! Direct HTTP client for the analysis service's REST API. Uses reqwest
//! instead of a generated API wrapper for stability and full control over
//! error classification. The client is stateless per call; conversation
//! continuity is carried solely by the session id the backend receives.

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::media::MediaFile;

/// Overall deadline for an analyze/continue call. Analysis of a large video
/// can take a while; the connect timeout stays short so a dead backend is
/// reported quickly.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response payload: {0}")]
    Parse(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Network(e.to_string())
    }
}

/// The two remote operations the orchestration core performs. A trait seam
/// so the controller can be driven against a test double.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Availability probe. Never errors; any failure maps to `false`.
    async fn check_health(&self) -> bool;

    /// Send conversation text, optionally with an attachment (analysis turn
    /// only), under the given session id. Returns the response text.
    async fn send_message(
        &self,
        text: &str,
        file: Option<&MediaFile>,
        session_id: &str,
    ) -> Result<String, TransportError>;
}

/// Success body of the analyze/continue call.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

/// HTTP implementation against the analysis backend.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn check_health(&self) -> bool {
        debug!("backend health check");
        match self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "health check failed");
                false
            }
        }
    }

    async fn send_message(
        &self,
        text: &str,
        file: Option<&MediaFile>,
        session_id: &str,
    ) -> Result<String, TransportError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TransportError::InvalidInput(
                "message text is empty".to_string(),
            ));
        }

        let mut form = multipart::Form::new()
            .text("message", text.to_string())
            .text("session_id", session_id.to_string());
        if let Some(f) = file {
            let part = multipart::Part::bytes(f.bytes.clone())
                .file_name(f.name.clone())
                .mime_str(&f.mime_type)
                .map_err(|e| TransportError::InvalidInput(e.to_string()))?;
            form = form.part("file", part);
        }

        debug!(session = %session_id, has_file = file.is_some(), "sending message");
        let resp = self
            .http
            .post(format!("{}/chat", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            error!(status = %status, body = %body, "chat request failed");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::Parse(format!("{}: {}", e, body)))?;
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_health_check_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri());
        assert!(transport.check_health().await);
    }

    #[tokio::test]
    async fn test_health_check_maps_server_error_to_false() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri());
        assert!(!transport.check_health().await);
    }

    #[tokio::test]
    async fn test_health_check_maps_connect_failure_to_false() {
        // Nothing is listening here.
        let transport = HttpTransport::new("http://127.0.0.1:1");
        assert!(!transport.check_health().await);
    }

    #[tokio::test]
    async fn test_send_message_returns_response_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "A car runs a red light at 0:04."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri());
        let result = transport
            .send_message("What happens?", None, "session_TEST")
            .await
            .unwrap();
        assert_eq!(result, "A car runs a red light at 0:04.");
    }

    #[tokio::test]
    async fn test_send_message_with_attachment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = MediaFile::new("clip.mp4", "video/mp4", vec![0u8; 64]);
        let transport = HttpTransport::new(&server.uri());
        let result = transport
            .send_message("Analyze this", Some(&file), "session_TEST")
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_message_classifies_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("analysis worker crashed"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri());
        let err = transport
            .send_message("hello", None, "session_TEST")
            .await
            .unwrap_err();
        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "analysis worker crashed");
            }
            other => panic!("expected Status error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_message_classifies_unparsable_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri());
        let err = transport
            .send_message("hello", None, "session_TEST")
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Parse(_)));
    }

    #[tokio::test]
    async fn test_send_message_rejects_blank_text() {
        // No server: the call must fail before any request is issued.
        let transport = HttpTransport::new("http://127.0.0.1:1");
        let err = transport
            .send_message("   ", None, "session_TEST")
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidInput(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new("http://localhost:8000/");
        assert_eq!(transport.base_url(), "http://localhost:8000");
    }
}
