//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that can return predefined
//! responses, byte streams or errors for testing purposes.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::TransportError;
use crate::traits::{ByteStream, HttpClient, MultipartForm, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Multipart text fields (POST only)
    pub fields: Vec<(String, String)>,
    /// Name of the uploaded file part (POST only)
    pub file_name: Option<String>,
}

impl RecordedRequest {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a complete response
    Success(Response),
    /// Fail before any response arrives
    Error(TransportError),
    /// Return a stream yielding these chunks in order
    Stream(Vec<Bytes>),
    /// Yield the chunks, then fail
    StreamError {
        chunks: Vec<Bytes>,
        error: TransportError,
    },
}

impl MockResponse {
    /// Convenience for a JSON body with the given status.
    pub fn json(status: u16, body: &str) -> Self {
        MockResponse::Success(Response::new(status, Bytes::from(body.to_string())))
    }

    /// Convenience for a stream of string chunks.
    pub fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockResponse::Stream(
            chunks
                .into_iter()
                .map(|chunk| Bytes::from(chunk.into()))
                .collect(),
        )
    }
}

/// Mock HTTP client for testing.
///
/// Responses are matched by exact URL first, then by prefix, then fall back
/// to the default response.
///
/// # Example
///
/// ```ignore
/// use lexchat::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "http://localhost:8000/sessions",
///     MockResponse::json(200, r#"{"status":"success","sessions":[]}"#),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    default_response: Arc<Mutex<Option<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a URL.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        lock(&self.responses).insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    fn record_request(&self, request: RecordedRequest) {
        lock(&self.requests).push(request);
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        let responses = lock(&self.responses);

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        // Longest prefix wins so "/history/S1" beats "/history"
        let prefix_match = responses
            .iter()
            .filter(|(pattern, _)| url.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, response)| response.clone());
        if prefix_match.is_some() {
            return prefix_match;
        }

        lock(&self.default_response).clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str) -> Result<Response, TransportError> {
        self.record_request(RecordedRequest {
            method: "GET".to_string(),
            url: url.to_string(),
            fields: Vec::new(),
            file_name: None,
        });

        match self.get_response(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Stream(_)) | Some(MockResponse::StreamError { .. }) => {
                Err(TransportError::Other {
                    message: "Stream response on non-stream request".to_string(),
                })
            }
            None => Err(TransportError::Other {
                message: format!("No mock response for URL: {}", url),
            }),
        }
    }

    async fn post_multipart_stream(
        &self,
        url: &str,
        form: MultipartForm,
    ) -> Result<ByteStream, TransportError> {
        self.record_request(RecordedRequest {
            method: "POST".to_string(),
            url: url.to_string(),
            fields: form.fields.clone(),
            file_name: Some(form.file.file_name.clone()),
        });

        match self.get_response(url) {
            Some(MockResponse::Stream(chunks)) => {
                Ok(Box::pin(stream::iter(chunks.into_iter().map(Ok))))
            }
            Some(MockResponse::StreamError { chunks, error }) => {
                let items = chunks
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(error)));
                Ok(Box::pin(stream::iter(items)))
            }
            Some(MockResponse::Success(response)) => {
                if !response.is_success() {
                    return Err(TransportError::HttpStatus {
                        status: response.status,
                        message: response.text().unwrap_or_default(),
                    });
                }
                if response.body.is_empty() {
                    return Err(TransportError::MissingBody);
                }
                Ok(Box::pin(stream::iter(std::iter::once(Ok(response.body)))))
            }
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(TransportError::Other {
                message: format!("No mock response for URL: {}", url),
            }),
        }
    }
}
