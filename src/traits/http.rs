//! HTTP client trait abstraction.
//!
//! Provides a trait-based abstraction for the two kinds of HTTP exchange the
//! client performs: plain GETs with a JSON body, and a multipart POST whose
//! response body is consumed incrementally.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use crate::error::TransportError;
use crate::models::UploadFile;

/// Incrementally read response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// HTTP response wrapper.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: Bytes) -> Self {
        Self { status, body }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as a string.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Parse the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A multipart form with one file part and optional text fields.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    /// Sent as the `file` part
    pub file: UploadFile,
    /// Extra text fields, in order
    pub fields: Vec<(String, String)>,
}

impl MultipartForm {
    pub fn new(file: UploadFile) -> Self {
        Self {
            file,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Trait for HTTP client operations.
///
/// Implementations include the production reqwest-based client and
/// [`crate::adapters::mock::MockHttpClient`] for tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request and read the whole body.
    ///
    /// Non-2xx statuses are returned as a `Response`, not an error.
    async fn get(&self, url: &str) -> Result<Response, TransportError>;

    /// POST a multipart form and return the response body as a stream.
    ///
    /// Fails with `HttpStatus` for non-2xx responses and with `MissingBody`
    /// when the response has nothing to read.
    async fn post_multipart_stream(
        &self,
        url: &str,
        form: MultipartForm,
    ) -> Result<ByteStream, TransportError>;
}
