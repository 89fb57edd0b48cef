//! Document upload and streamed summary.
//!
//! One upload is one request: the file (plus the current session id, if
//! any) goes up as a multipart form, and the summary comes back as a stream
//! of `data:` events. The session the backend assigns is reported at the end
//! so the caller can reconcile its local identity.

use futures_util::StreamExt;
use tracing::{debug, info};

use crate::backend::BackendClient;
use crate::error::LexResult;
use crate::frame::{Frame, UploadControl, UploadFrameDecoder};
use crate::models::{SessionId, UploadFile};

/// Receives upload events as they are decoded.
pub trait UploadObserver: Send {
    /// A fragment of summary text (or undecodable line kept as text).
    fn on_content(&mut self, text: &str);

    /// A progress notification such as "Extracting text...".
    fn on_status(&mut self, status: &str, message: &str) {
        let _ = (status, message);
    }
}

/// Result of a completed upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOutcome {
    /// Last session id the backend asserted, if any.
    pub confirmed: Option<SessionId>,
    /// All content fragments, in arrival order.
    pub text: String,
}

/// Runs uploads against a backend.
pub struct UploadSession<'a> {
    backend: &'a BackendClient,
}

impl<'a> UploadSession<'a> {
    pub fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// Upload `file` and consume the response to its end.
    ///
    /// Content fragments and status notifications are delivered to
    /// `observer` as they arrive. Any transport failure (refused connection,
    /// non-OK status, missing body, or the stream breaking mid-way) aborts
    /// the whole upload; a single undecodable line does not.
    pub async fn run(
        &self,
        file: &UploadFile,
        known_session: Option<&SessionId>,
        observer: &mut dyn UploadObserver,
    ) -> LexResult<UploadOutcome> {
        let mut stream = self.backend.upload_stream(file, known_session).await?;
        let mut decoder = UploadFrameDecoder::new();
        let mut outcome = UploadOutcome::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for frame in decoder.feed(&chunk) {
                route(frame, &mut outcome, observer);
            }
        }

        if let Some(frame) = decoder.finish() {
            debug!("Upload stream ended without a trailing newline");
            route(frame, &mut outcome, observer);
        }

        info!(
            "Upload of {} finished ({} chars, session {:?})",
            file.file_name,
            outcome.text.len(),
            outcome.confirmed
        );
        Ok(outcome)
    }
}

fn route(
    frame: Frame<UploadControl>,
    outcome: &mut UploadOutcome,
    observer: &mut dyn UploadObserver,
) {
    match frame {
        Frame::Control(UploadControl::SessionAssigned(id)) => {
            if let Some(previous) = outcome.confirmed.as_ref() {
                if previous != &id {
                    debug!("Upload session reassigned {} -> {}", previous, id);
                }
            }
            outcome.confirmed = Some(id);
        }
        Frame::Control(UploadControl::Status { status, message }) => {
            debug!("Upload status {}: {}", status, message);
            observer.on_status(&status, &message);
        }
        Frame::Content(text) | Frame::Literal(text) => {
            outcome.text.push_str(&text);
            observer.on_content(&text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::config::ClientConfig;
    use crate::error::{LexError, TransportError};
    use bytes::Bytes;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        content: Vec<String>,
        statuses: Vec<(String, String)>,
    }

    impl UploadObserver for Recorder {
        fn on_content(&mut self, text: &str) {
            self.content.push(text.to_string());
        }

        fn on_status(&mut self, status: &str, message: &str) {
            self.statuses.push((status.to_string(), message.to_string()));
        }
    }

    const UPLOAD_URL: &str = "http://backend/upload";

    fn backend(response: MockResponse) -> (BackendClient, MockHttpClient) {
        let mock = MockHttpClient::new();
        mock.set_response(UPLOAD_URL, response);
        let config = ClientConfig::new().with_http_base_url("http://backend");
        (BackendClient::with_http(config, Arc::new(mock.clone())), mock)
    }

    fn file() -> UploadFile {
        UploadFile::new("lease.pdf", Bytes::from_static(b"%PDF-1.4"))
    }

    #[tokio::test]
    async fn test_session_and_chunks() {
        let (backend, mock) = backend(MockResponse::chunks([
            "data: {\"status\": \"session_id\", \"session_id\": \"S1\"}\n",
            "data: {\"status\": \"summary_chunk\", \"content\": \"Part A. \"}\n",
            "data: {\"status\": \"summary_chunk\", \"content\": \"Part B.\"}\n",
        ]));
        let mut recorder = Recorder::default();

        let outcome = UploadSession::new(&backend)
            .run(&file(), None, &mut recorder)
            .await
            .unwrap();

        assert_eq!(outcome.confirmed, Some(SessionId::new("S1")));
        assert_eq!(outcome.text, "Part A. Part B.");
        assert_eq!(recorder.content, vec!["Part A. ", "Part B."]);
        assert_eq!(mock.get_requests()[0].field("session_id"), None);
    }

    #[tokio::test]
    async fn test_lines_split_across_chunks() {
        let (backend, _mock) = backend(MockResponse::chunks([
            "data: {\"status\": \"summ",
            "ary_chunk\", \"content\": \"Whole\"}\ndata: {\"status\": \"summary_chunk\",",
            " \"content\": \" line\"}\n",
        ]));
        let mut recorder = Recorder::default();

        let outcome = UploadSession::new(&backend)
            .run(&file(), Some(&SessionId::new("S0")), &mut recorder)
            .await
            .unwrap();

        assert_eq!(outcome.text, "Whole line");
        assert_eq!(outcome.confirmed, None);
    }

    #[tokio::test]
    async fn test_status_goes_to_observer_not_text() {
        let (backend, _mock) = backend(MockResponse::chunks([
            "data: {\"status\": \"processing\", \"message\": \"Extracting text\"}\n",
            "data: {\"status\": \"summary_chunk\", \"content\": \"Summary\"}\n",
        ]));
        let mut recorder = Recorder::default();

        let outcome = UploadSession::new(&backend)
            .run(&file(), None, &mut recorder)
            .await
            .unwrap();

        assert_eq!(outcome.text, "Summary");
        assert_eq!(
            recorder.statuses,
            vec![("processing".to_string(), "Extracting text".to_string())]
        );
    }

    #[tokio::test]
    async fn test_malformed_line_kept_as_text() {
        let (backend, _mock) = backend(MockResponse::chunks([
            "data: {\"status\": \"summary_chunk\", \"content\": \"A\"}\n",
            "data: not json at all\n",
            "data: {\"status\": \"summary_chunk\", \"content\": \"B\"}\n",
        ]));
        let mut recorder = Recorder::default();

        let outcome = UploadSession::new(&backend)
            .run(&file(), None, &mut recorder)
            .await
            .unwrap();

        assert_eq!(outcome.text, "Anot json at allB");
    }

    #[tokio::test]
    async fn test_last_session_assertion_wins() {
        let (backend, _mock) = backend(MockResponse::chunks([
            "data: {\"status\": \"session_id\", \"session_id\": \"S1\"}\n",
            "data: {\"status\": \"session_id\", \"session_id\": \"S2\"}\n",
        ]));
        let mut recorder = Recorder::default();

        let outcome = UploadSession::new(&backend)
            .run(&file(), None, &mut recorder)
            .await
            .unwrap();

        assert_eq!(outcome.confirmed, Some(SessionId::new("S2")));
        assert!(outcome.text.is_empty());
    }

    #[tokio::test]
    async fn test_final_line_without_newline() {
        let (backend, _mock) = backend(MockResponse::chunks([
            "data: {\"status\": \"summary_chunk\", \"content\": \"tail\"}",
        ]));
        let mut recorder = Recorder::default();

        let outcome = UploadSession::new(&backend)
            .run(&file(), None, &mut recorder)
            .await
            .unwrap();

        assert_eq!(outcome.text, "tail");
    }

    #[tokio::test]
    async fn test_non_ok_status_fails() {
        let (backend, _mock) = backend(MockResponse::json(500, "Internal Server Error"));
        let mut recorder = Recorder::default();

        let err = UploadSession::new(&backend)
            .run(&file(), None, &mut recorder)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LexError::Transport(TransportError::HttpStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_body_fails() {
        let (backend, _mock) = backend(MockResponse::json(200, ""));
        let mut recorder = Recorder::default();

        let err = UploadSession::new(&backend)
            .run(&file(), None, &mut recorder)
            .await
            .unwrap_err();

        assert_eq!(err, LexError::Transport(TransportError::MissingBody));
    }

    #[tokio::test]
    async fn test_stream_failure_is_terminal() {
        let (backend, _mock) = backend(MockResponse::StreamError {
            chunks: vec![Bytes::from(
                "data: {\"status\": \"summary_chunk\", \"content\": \"partial\"}\n",
            )],
            error: TransportError::Stream {
                message: "connection reset".to_string(),
            },
        });
        let mut recorder = Recorder::default();

        let result = UploadSession::new(&backend)
            .run(&file(), None, &mut recorder)
            .await;

        assert!(matches!(
            result,
            Err(LexError::Transport(TransportError::Stream { .. }))
        ));
        assert_eq!(recorder.content, vec!["partial"]);
    }
}
