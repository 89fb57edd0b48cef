//! Error category classification.
//!
//! Categories drive the handling decision at the edge of the application:
//! whether a failure is retried in the background or shown to the user.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection refused, dropped sockets, unreadable bodies.
    Network,

    /// Backend answered with a non-success status.
    Server,

    /// A frame or payload could not be understood.
    /// Recovered locally, never surfaced as a failure.
    Decode,

    /// The user has to wait or act before retrying (e.g. channel not open yet).
    User,

    /// Local filesystem or OS errors.
    System,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::Decode => "decode",
            ErrorCategory::User => "user",
            ErrorCategory::System => "system",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_categories() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Server.is_retryable());
        assert!(!ErrorCategory::Decode.is_retryable());
        assert!(!ErrorCategory::User.is_retryable());
        assert!(!ErrorCategory::System.is_retryable());
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(ErrorCategory::Network.to_string(), "network");
        assert_eq!(ErrorCategory::Decode.to_string(), "decode");
    }
}
