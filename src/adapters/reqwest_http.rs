//! Reqwest-based HTTP client adapter.
//!
//! This module provides the production HTTP client implementation using
//! reqwest, implementing the [`HttpClient`] trait from `crate::traits`.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};

use crate::error::{classify_reqwest_error, TransportError};
use crate::traits::{ByteStream, HttpClient, MultipartForm, Response};

/// HTTP client implementation using reqwest.
///
/// # Example
///
/// ```ignore
/// use lexchat::adapters::ReqwestHttpClient;
/// use lexchat::traits::HttpClient;
///
/// let client = ReqwestHttpClient::new();
/// let response = client.get("http://localhost:8000/health").await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestHttpClient with a custom reqwest::Client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    fn build_form(form: MultipartForm) -> Result<Form, TransportError> {
        let file = form.file;
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name)
            .mime_str(&file.mime_type)
            .map_err(|e| TransportError::Other {
                message: format!("invalid MIME type: {}", e),
            })?;

        let mut multipart = Form::new().part("file", part);
        for (name, value) in form.fields {
            multipart = multipart.text(name, value);
        }
        Ok(multipart)
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<Response, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, url))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e, url))?;

        Ok(Response::new(status, body))
    }

    async fn post_multipart_stream(
        &self,
        url: &str,
        form: MultipartForm,
    ) -> Result<ByteStream, TransportError> {
        let multipart = Self::build_form(form)?;

        let response = self
            .client
            .post(url)
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, url))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::HttpStatus { status, message });
        }

        if response.content_length() == Some(0) {
            return Err(TransportError::MissingBody);
        }

        let stream = response.bytes_stream().map(|result| {
            result.map_err(|e| TransportError::Stream {
                message: e.to_string(),
            })
        });

        Ok(Box::pin(stream))
    }
}
