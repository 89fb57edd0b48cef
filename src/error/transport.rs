//! Transport-level error types.
//!
//! Everything that goes wrong between us and the backend before a payload
//! can even be decoded: refused connections, non-success statuses, and
//! responses without a readable body.

use std::fmt;

/// Transport-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Connection to the server failed.
    ConnectionFailed { url: String, message: String },

    /// HTTP status error (non-2xx response).
    HttpStatus { status: u16, message: String },

    /// The response carried no readable body.
    MissingBody,

    /// Reading an incremental body failed part-way through.
    Stream { message: String },

    /// Generic transport error.
    Other { message: String },
}

impl TransportError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. } => true,
            TransportError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            TransportError::MissingBody => false,
            TransportError::Stream { .. } => true,
            TransportError::Other { .. } => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::ConnectionFailed { .. } => {
                "Unable to connect to the server. Is the backend running?".to_string()
            }
            TransportError::HttpStatus { status, .. } => match *status {
                400 => "The request was invalid. Please try again.".to_string(),
                404 => "The requested resource was not found.".to_string(),
                413 => "The file is too large for the server to accept.".to_string(),
                500..=599 => "The server is experiencing issues. Please try again later.".to_string(),
                _ => format!("The server returned an error (HTTP {}).", status),
            },
            TransportError::MissingBody => {
                "The server response had no readable body.".to_string()
            }
            TransportError::Stream { .. } => {
                "The response stream was interrupted.".to_string()
            }
            TransportError::Other { message } => format!("Network error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::ConnectionFailed { .. } => "E_NET_CONN",
            TransportError::HttpStatus { .. } => "E_NET_HTTP",
            TransportError::MissingBody => "E_NET_NOBODY",
            TransportError::Stream { .. } => "E_NET_STREAM",
            TransportError::Other { .. } => "E_NET_OTHER",
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectionFailed { url, message } => {
                write!(f, "Connection failed to '{}': {}", url, message)
            }
            TransportError::HttpStatus { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            TransportError::MissingBody => write!(f, "Response has no readable body"),
            TransportError::Stream { message } => write!(f, "Stream read failed: {}", message),
            TransportError::Other { message } => write!(f, "Transport error: {}", message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Classify a reqwest error into a TransportError.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str) -> TransportError {
    if err.is_connect() {
        TransportError::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else if let Some(status) = err.status() {
        TransportError::HttpStatus {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else if err.is_body() || err.is_decode() {
        TransportError::Stream {
            message: err.to_string(),
        }
    } else {
        TransportError::Other {
            message: err.to_string(),
        }
    }
}
