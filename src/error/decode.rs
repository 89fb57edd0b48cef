//! Frame decoding errors.
//!
//! A `DecodeError` never escapes the decoder: the decoder logs it and
//! degrades the offending line to literal content. The type exists so the
//! fallback path can say precisely what went wrong.

use std::fmt;

/// Reasons a single frame could not be decoded as structured data.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The payload was not valid JSON.
    InvalidJson { message: String },

    /// The payload was JSON but not an object carrying a `status` field.
    MissingStatus,

    /// Bytes on the wire were not valid UTF-8.
    InvalidUtf8,
}

impl DecodeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DecodeError::InvalidJson { .. } => "E_DEC_JSON",
            DecodeError::MissingStatus => "E_DEC_STATUS",
            DecodeError::InvalidUtf8 => "E_DEC_UTF8",
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidJson { message } => write!(f, "Invalid JSON: {}", message),
            DecodeError::MissingStatus => write!(f, "Payload has no status field"),
            DecodeError::InvalidUtf8 => write!(f, "Payload is not valid UTF-8"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::InvalidJson {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_error() {
        let err: DecodeError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, DecodeError::InvalidJson { .. }));
        assert_eq!(err.error_code(), "E_DEC_JSON");
    }
}
