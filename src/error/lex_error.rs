//! Unified error type for lexchat.

use std::fmt;

use super::category::ErrorCategory;
use super::decode::DecodeError;
use super::transport::TransportError;

/// Unified error type for lexchat.
///
/// No variant is fatal to the process: transport failures are shown to the
/// user (or retried by the chat supervisor), decode failures are recovered
/// locally, and `NotConnected` re-enables input so the user can try again.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    /// Connection refused, non-OK status, or missing response body.
    Transport(TransportError),

    /// A frame failed to parse. Only produced by helpers that want to
    /// report the failure; the decoders themselves fall back to literal text.
    Decode(DecodeError),

    /// Attempted to send on the chat channel while it is not open.
    NotConnected,

    /// A chat turn was submitted while an upload owns the live buffer.
    UploadInProgress,

    /// Local filesystem error (e.g. reading a file to upload).
    Io(String),
}

impl LexError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            LexError::Transport(TransportError::HttpStatus { .. }) => ErrorCategory::Server,
            LexError::Transport(_) => ErrorCategory::Network,
            LexError::Decode(_) => ErrorCategory::Decode,
            LexError::NotConnected | LexError::UploadInProgress => ErrorCategory::User,
            LexError::Io(_) => ErrorCategory::System,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            LexError::Transport(err) => err.is_retryable(),
            LexError::NotConnected => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            LexError::Transport(err) => err.user_message(),
            LexError::Decode(_) => "Received data the client could not understand.".to_string(),
            LexError::NotConnected => {
                "Not connected to the chat server. Please try again in a moment.".to_string()
            }
            LexError::UploadInProgress => {
                "Please wait for the document upload to finish.".to_string()
            }
            LexError::Io(message) => format!("Could not read file: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            LexError::Transport(err) => err.error_code(),
            LexError::Decode(err) => err.error_code(),
            LexError::NotConnected => "E_WS_NOTCONN",
            LexError::UploadInProgress => "E_APP_BUSY",
            LexError::Io(_) => "E_SYS_IO",
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::Transport(err) => write!(f, "{}", err),
            LexError::Decode(err) => write!(f, "{}", err),
            LexError::NotConnected => write!(f, "Chat channel is not open"),
            LexError::UploadInProgress => write!(f, "An upload is in progress"),
            LexError::Io(message) => write!(f, "IO error: {}", message),
        }
    }
}

impl std::error::Error for LexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LexError::Transport(err) => Some(err),
            LexError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for LexError {
    fn from(err: TransportError) -> Self {
        LexError::Transport(err)
    }
}

impl From<DecodeError> for LexError {
    fn from(err: DecodeError) -> Self {
        LexError::Decode(err)
    }
}

impl From<std::io::Error> for LexError {
    fn from(err: std::io::Error) -> Self {
        LexError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err: LexError = TransportError::MissingBody.into();
        assert_eq!(err.category(), ErrorCategory::Network);

        let err: LexError = TransportError::HttpStatus {
            status: 500,
            message: "x".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Server);

        assert_eq!(LexError::NotConnected.category(), ErrorCategory::User);
        assert_eq!(
            LexError::Io("gone".to_string()).category(),
            ErrorCategory::System
        );
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.pdf");
        let err: LexError = io_err.into();
        assert!(matches!(err, LexError::Io(_)));
        assert!(err.user_message().contains("missing.pdf"));
    }

    #[test]
    fn test_not_connected_is_retryable() {
        assert!(LexError::NotConnected.is_retryable());
        assert!(!LexError::UploadInProgress.is_retryable());
        assert_eq!(LexError::NotConnected.error_code(), "E_WS_NOTCONN");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;
        let err: LexError = TransportError::MissingBody.into();
        assert!(err.source().is_some());
        assert!(LexError::NotConnected.source().is_none());
    }
}
