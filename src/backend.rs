//! HTTP client for the backend's REST endpoints.
//!
//! Covers everything except the chat websocket: the session list, per-session
//! history, the health probe, and opening the upload stream. Decoding of the
//! upload stream itself lives in [`crate::upload`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapters::ReqwestHttpClient;
use crate::config::ClientConfig;
use crate::error::{DecodeError, LexResult, TransportError};
use crate::models::{
    HistoryRecord, HistoryResponse, Message, SessionEntry, SessionId, SessionsResponse, UploadFile,
};
use crate::traits::{ByteStream, HttpClient, MultipartForm, Response};

/// Multipart field carrying the known session id.
pub const SESSION_FIELD: &str = "session_id";

/// Client for the backend's HTTP API.
///
/// Generic over [`HttpClient`] so tests can substitute
/// [`crate::adapters::mock::MockHttpClient`].
#[derive(Clone)]
pub struct BackendClient {
    http: Arc<dyn HttpClient>,
    config: ClientConfig,
}

impl BackendClient {
    /// Create a client backed by reqwest.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http(config, Arc::new(ReqwestHttpClient::new()))
    }

    /// Create a client with a custom HTTP implementation.
    pub fn with_http(config: ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch the session list. Titles are returned as sent; the catalog
    /// normalizes them.
    pub async fn fetch_sessions(&self) -> LexResult<Vec<SessionEntry>> {
        let url = self.config.sessions_url();
        let response = ensure_success(self.http.get(&url).await?)?;
        let body: SessionsResponse = response.json().map_err(DecodeError::from)?;

        if let Some(status) = body.status.as_deref() {
            if status != "success" {
                warn!("Session list returned status {:?}", status);
            }
        }
        debug!("Fetched {} sessions", body.sessions.len());
        Ok(body.sessions)
    }

    /// Fetch the stored transcript for a session.
    ///
    /// A status object instead of an array means the session has no stored
    /// messages and yields an empty transcript. Records with a role we do
    /// not render are skipped.
    pub async fn fetch_history(&self, session_id: &SessionId) -> LexResult<Vec<Message>> {
        let url = self.config.history_url(session_id.as_str());
        let response = ensure_success(self.http.get(&url).await?)?;
        let body: HistoryResponse = response.json().map_err(DecodeError::from)?;

        if let HistoryResponse::Status { status, message } = &body {
            debug!(
                "History for {} returned status {:?}: {:?}",
                session_id, status, message
            );
        }

        let messages = body
            .into_records()
            .into_iter()
            .filter_map(|record: HistoryRecord| {
                let role = record.role.clone();
                let message = record.into_message();
                if message.is_none() {
                    warn!("Skipping history record with unknown role {:?}", role);
                }
                message
            })
            .collect();
        Ok(messages)
    }

    /// Check if the backend is reachable and healthy.
    pub async fn health_check(&self) -> bool {
        match self.http.get(&self.config.health_url()).await {
            Ok(response) => response.is_success(),
            Err(e) => {
                debug!("Health check failed: {}", e);
                false
            }
        }
    }

    /// Start an upload and return the raw response body stream.
    ///
    /// The `session_id` field is only included when an identity is known;
    /// without it the backend mints a new session and announces it in the
    /// stream.
    pub async fn upload_stream(
        &self,
        file: &UploadFile,
        session_id: Option<&SessionId>,
    ) -> LexResult<ByteStream> {
        let mut form = MultipartForm::new(file.clone());
        if let Some(id) = session_id {
            form = form.with_field(SESSION_FIELD, id.as_str());
        }

        debug!(
            "Uploading {} ({}) with session {:?}",
            file.file_name,
            file.format_size(),
            session_id
        );
        let stream = self
            .http
            .post_multipart_stream(&self.config.upload_url(), form)
            .await?;
        Ok(stream)
    }
}

fn ensure_success(response: Response) -> Result<Response, TransportError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(TransportError::HttpStatus {
            status: response.status,
            message: response.text().unwrap_or_default(),
        })
    }
}
