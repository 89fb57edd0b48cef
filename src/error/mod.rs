//! Error handling for lexchat.
//!
//! - **Error Categories**: high-level classification for handling decisions
//! - **Domain errors**: `TransportError` and `DecodeError`
//! - **Unified error**: `LexError` consolidates them with `NotConnected`
//! - **Result alias**: `LexResult<T>`
//!
//! | Error | Handling |
//! |-------|----------|
//! | `TransportError` | Shown to the user; the chat channel reconnects on its own |
//! | `DecodeError` | Recovered locally by treating the frame as literal text |
//! | `NotConnected` | Returned to the caller; the turn fails and input is re-enabled |

mod category;
mod decode;
mod lex_error;
mod transport;

pub use category::ErrorCategory;
pub use decode::DecodeError;
pub use lex_error::LexError;
pub use transport::{classify_reqwest_error, TransportError};

/// Type alias for Results using LexError.
pub type LexResult<T> = Result<T, LexError>;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_question_mark_conversion() {
        fn fails() -> LexResult<()> {
            Err(TransportError::MissingBody)?;
            Ok(())
        }

        let err = fails().unwrap_err();
        assert_eq!(err, LexError::Transport(TransportError::MissingBody));
        assert!(!err.user_message().is_empty());
    }
}
