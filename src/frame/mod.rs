//! Frame decoding for both transports.
//!
//! Each raw record is classified exactly once into a [`Frame`]:
//!
//! - `Control` - structured metadata (identity assertions, status notices)
//! - `Content` - a text fragment the protocol explicitly marked as content
//! - `Literal` - text that could not be decoded as structured data and is
//!   passed through verbatim so nothing is lost
//!
//! # Module structure
//! - `sse` - line-framed `data: {json}` events from the upload endpoint
//! - `chat` - whole-message frames from the chat websocket

mod chat;
mod sse;

pub use chat::decode_chat_frame;
pub use sse::{decode_upload_line, decode_upload_payload, UploadControl, UploadFrameDecoder, DATA_PREFIX};

/// One decoded unit from either transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame<C> {
    /// Structured control data.
    Control(C),
    /// Text the protocol tagged as response content.
    Content(String),
    /// Undecodable text, passed through as content.
    Literal(String),
}

impl<C> Frame<C> {
    /// Text to append to the live buffer, if this frame carries any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Frame::Content(text) | Frame::Literal(text) => Some(text),
            Frame::Control(_) => None,
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self, Frame::Control(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_text() {
        let content: Frame<()> = Frame::Content("a".to_string());
        let literal: Frame<()> = Frame::Literal("b".to_string());
        let control: Frame<()> = Frame::Control(());
        assert_eq!(content.text(), Some("a"));
        assert_eq!(literal.text(), Some("b"));
        assert_eq!(control.text(), None);
        assert!(control.is_control());
    }
}
