//! Chat channel frame decoding.
//!
//! Every inbound websocket message is one frame. The backend interleaves two
//! kinds on the same channel: a JSON control object (`{"session_id": ...}`)
//! and raw response text streamed token by token. There is no marker
//! between them, so each frame is tried as JSON first.

use tracing::trace;

use super::Frame;
use crate::websocket::messages::ChatControl;

const CONTROL_FIELDS: &[&str] = &["session_id", "title", "info"];

/// Classify one inbound chat frame.
///
/// A frame is `Control` only when it is a JSON object carrying at least one
/// control field. Everything else, including text that happens to be valid
/// JSON such as `42` or `"quoted"`, is a `Literal` fragment kept verbatim.
pub fn decode_chat_frame(text: &str) -> Frame<ChatControl> {
    let value = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => value,
        Err(_) => return Frame::Literal(text.to_string()),
    };

    let is_control = value
        .as_object()
        .map(|obj| CONTROL_FIELDS.iter().any(|field| obj.contains_key(*field)))
        .unwrap_or(false);
    if !is_control {
        trace!("JSON chat frame without control fields, keeping as text");
        return Frame::Literal(text.to_string());
    }

    match serde_json::from_value::<ChatControl>(value) {
        Ok(control) => Frame::Control(control),
        Err(e) => {
            trace!("Control-shaped chat frame failed to decode ({}), keeping as text", e);
            Frame::Literal(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionId;

    #[test]
    fn test_session_assertion() {
        let frame = decode_chat_frame(r#"{"session_id": "S9", "info": "New session created"}"#);
        match frame {
            Frame::Control(control) => {
                assert_eq!(control.session_id, Some(SessionId::new("S9")));
                assert_eq!(control.info.as_deref(), Some("New session created"));
                assert_eq!(control.title, None);
            }
            other => panic!("Expected control frame, got {:?}", other),
        }
    }

    #[test]
    fn test_title_only_control() {
        let frame = decode_chat_frame(r#"{"title": "\"Lease Break\""}"#);
        assert!(frame.is_control());
    }

    #[test]
    fn test_plain_text_is_literal() {
        assert_eq!(
            decode_chat_frame("Under most tenancy"),
            Frame::Literal("Under most tenancy".to_string())
        );
    }

    #[test]
    fn test_whitespace_is_preserved() {
        assert_eq!(decode_chat_frame(" laws"), Frame::Literal(" laws".to_string()));
        assert_eq!(decode_chat_frame("\n\n"), Frame::Literal("\n\n".to_string()));
    }

    #[test]
    fn test_json_scalars_are_text() {
        assert_eq!(decode_chat_frame("42"), Frame::Literal("42".to_string()));
        assert_eq!(decode_chat_frame("true"), Frame::Literal("true".to_string()));
        assert_eq!(
            decode_chat_frame("\"quoted\""),
            Frame::Literal("\"quoted\"".to_string())
        );
    }

    #[test]
    fn test_json_object_without_control_fields_is_text() {
        let raw = r#"{"document_type": "lease"}"#;
        assert_eq!(decode_chat_frame(raw), Frame::Literal(raw.to_string()));
    }

    #[test]
    fn test_control_with_wrong_types_is_text() {
        let raw = r#"{"session_id": 12}"#;
        assert_eq!(decode_chat_frame(raw), Frame::Literal(raw.to_string()));
    }
}
