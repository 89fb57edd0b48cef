//! Upload stream decoding.
//!
//! The upload endpoint answers with a chunked body where each event is one
//! line: `data: ` followed by a JSON object and a newline. The payload is a
//! status-tagged union:
//!
//! - `{"status": "session_id", "session_id": ...}` - identity assertion
//! - `{"status": "summary_chunk", "content": ...}` - summary text
//! - `{"status": <other>, "message": ...}` - progress notification
//!
//! Chunk boundaries carry no meaning: a chunk may hold several lines or end
//! in the middle of one. [`UploadFrameDecoder`] keeps the unterminated tail
//! of each chunk and prepends it to the next one.

use serde::Deserialize;
use tracing::{debug, warn};

use super::Frame;
use crate::error::DecodeError;
use crate::models::SessionId;

/// Prefix of every event line.
pub const DATA_PREFIX: &str = "data:";

const STATUS_SESSION_ID: &str = "session_id";
const STATUS_SUMMARY_CHUNK: &str = "summary_chunk";

/// Control events of the upload stream.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadControl {
    /// The backend asserted the session this upload belongs to.
    SessionAssigned(SessionId),
    /// A progress notification, not shown in the transcript.
    Status { status: String, message: String },
}

#[derive(Debug, Deserialize)]
struct UploadPayload {
    status: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Decode the JSON payload of a single event.
///
/// Returns `Ok(None)` for well-formed events that carry nothing to act on
/// (an empty chunk, an unknown status without a message).
pub fn decode_upload_payload(data: &str) -> Result<Option<Frame<UploadControl>>, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(data)?;
    if !value.is_object() {
        return Err(DecodeError::MissingStatus);
    }
    let payload: UploadPayload = serde_json::from_value(value)?;
    let status = payload.status.ok_or(DecodeError::MissingStatus)?;

    match status.as_str() {
        STATUS_SESSION_ID => match payload.session_id {
            Some(id) if !id.is_empty() => Ok(Some(Frame::Control(
                UploadControl::SessionAssigned(SessionId::new(id)),
            ))),
            _ => {
                warn!("session_id event without an id: {}", data);
                Ok(None)
            }
        },
        STATUS_SUMMARY_CHUNK => match payload.content {
            Some(content) if !content.is_empty() => Ok(Some(Frame::Content(content))),
            _ => Ok(None),
        },
        _ => match payload.message {
            Some(message) => Ok(Some(Frame::Control(UploadControl::Status { status, message }))),
            None => {
                debug!("Ignoring upload status '{}' without message", status);
                Ok(None)
            }
        },
    }
}

/// Decode one complete line of the upload stream.
///
/// Lines without the `data:` prefix (blank separators, comments) yield
/// `None`. A payload that fails to decode is returned as
/// [`Frame::Literal`] holding the text after the prefix.
pub fn decode_upload_line(line: &str) -> Option<Frame<UploadControl>> {
    let line = line.trim_end_matches('\r');
    let rest = line.strip_prefix(DATA_PREFIX)?;
    let data = rest.strip_prefix(' ').unwrap_or(rest);
    if data.is_empty() {
        return None;
    }

    match decode_upload_payload(data) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Upload line fell back to literal text ({}): {}", e, data);
            Some(Frame::Literal(data.to_string()))
        }
    }
}

/// Stateful decoder that turns arbitrary body chunks into frames.
#[derive(Debug, Default)]
pub struct UploadFrameDecoder {
    /// Bytes after the last newline seen so far
    pending: Vec<u8>,
}

impl UploadFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body, returning every frame completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame<UploadControl>> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(frame) = decode_line_bytes(&line[..line.len() - 1]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush a final line that arrived without a trailing newline.
    pub fn finish(&mut self) -> Option<Frame<UploadControl>> {
        if self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        decode_line_bytes(&line)
    }

    /// Bytes buffered while waiting for the end of a line.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line_bytes(bytes: &[u8]) -> Option<Frame<UploadControl>> {
    match std::str::from_utf8(bytes) {
        Ok(line) => decode_upload_line(line),
        Err(_) => {
            warn!("{}; decoding lossily", DecodeError::InvalidUtf8);
            decode_upload_line(&String::from_utf8_lossy(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(text: &str) -> Frame<UploadControl> {
        Frame::Content(text.to_string())
    }

    #[test]
    fn test_session_id_event() {
        let frame = decode_upload_line(r#"data: {"status": "session_id", "session_id": "S1"}"#);
        assert_eq!(
            frame,
            Some(Frame::Control(UploadControl::SessionAssigned(SessionId::new("S1"))))
        );
    }

    #[test]
    fn test_summary_chunk_event() {
        let frame = decode_upload_line(r#"data: {"status": "summary_chunk", "content": "Part A. "}"#);
        assert_eq!(frame, Some(content("Part A. ")));
    }

    #[test]
    fn test_status_event() {
        let frame = decode_upload_line(
            r#"data: {"status": "processing", "message": "Extracting sections"}"#,
        );
        assert_eq!(
            frame,
            Some(Frame::Control(UploadControl::Status {
                status: "processing".to_string(),
                message: "Extracting sections".to_string(),
            }))
        );
    }

    #[test]
    fn test_status_without_message_is_ignored() {
        assert_eq!(decode_upload_line(r#"data: {"status": "heartbeat"}"#), None);
    }

    #[test]
    fn test_malformed_json_becomes_literal() {
        let frame = decode_upload_line("data: {\"status\": \"summary_chunk\", \"content\": ");
        assert_eq!(
            frame,
            Some(Frame::Literal("{\"status\": \"summary_chunk\", \"content\": ".to_string()))
        );

        let frame = decode_upload_line("data: plain words");
        assert_eq!(frame, Some(Frame::Literal("plain words".to_string())));
    }

    #[test]
    fn test_json_without_status_becomes_literal() {
        let frame = decode_upload_line(r#"data: {"error": "Failed to generate summary."}"#);
        assert_eq!(
            frame,
            Some(Frame::Literal(r#"{"error": "Failed to generate summary."}"#.to_string()))
        );
        assert_eq!(
            decode_upload_line("data: 42"),
            Some(Frame::Literal("42".to_string()))
        );
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        assert_eq!(decode_upload_line(""), None);
        assert_eq!(decode_upload_line(": keepalive"), None);
        assert_eq!(decode_upload_line("event: summary"), None);
        assert_eq!(decode_upload_line("data: "), None);
    }

    #[test]
    fn test_prefix_without_space_and_crlf() {
        let frame = decode_upload_line("data:{\"status\":\"summary_chunk\",\"content\":\"x\"}\r");
        assert_eq!(frame, Some(content("x")));
    }

    #[test]
    fn test_decoder_multiple_lines_in_one_chunk() {
        let mut decoder = UploadFrameDecoder::new();
        let chunk = concat!(
            "data: {\"status\": \"session_id\", \"session_id\": \"S1\"}\n",
            "\n",
            "data: {\"status\": \"summary_chunk\", \"content\": \"Part A. \"}\n",
            "data: {\"status\": \"summary_chunk\", \"content\": \"Part B.\"}\n",
        );
        let frames = decoder.feed(chunk.as_bytes());
        assert_eq!(frames.len(), 3);
        assert!(frames[0].is_control());
        assert_eq!(frames[1], content("Part A. "));
        assert_eq!(frames[2], content("Part B."));
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_decoder_line_split_across_chunks() {
        let mut decoder = UploadFrameDecoder::new();
        let line = "data: {\"status\": \"summary_chunk\", \"content\": \"split here\"}\n";
        let (first, second) = line.split_at(27);

        assert!(decoder.feed(first.as_bytes()).is_empty());
        assert_eq!(decoder.pending_len(), first.len());
        assert_eq!(decoder.feed(second.as_bytes()), vec![content("split here")]);
    }

    #[test]
    fn test_decoder_byte_at_a_time() {
        let mut decoder = UploadFrameDecoder::new();
        let body = "data: {\"status\": \"summary_chunk\", \"content\": \"héllo \"}\ndata: {\"status\": \"summary_chunk\", \"content\": \"wörld\"}\n";
        let mut frames = Vec::new();
        for byte in body.as_bytes() {
            frames.extend(decoder.feed(std::slice::from_ref(byte)));
        }
        let text: String = frames.iter().filter_map(|f| f.text()).collect();
        assert_eq!(text, "héllo wörld");
    }

    #[test]
    fn test_decoder_finish_flushes_unterminated_line() {
        let mut decoder = UploadFrameDecoder::new();
        assert!(decoder
            .feed(b"data: {\"status\": \"summary_chunk\", \"content\": \"tail\"}")
            .is_empty());
        assert_eq!(decoder.finish(), Some(content("tail")));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_decoder_preserves_order() {
        let mut decoder = UploadFrameDecoder::new();
        let mut body = String::new();
        for i in 0..20 {
            body.push_str(&format!(
                "data: {{\"status\": \"summary_chunk\", \"content\": \"{} \"}}\n",
                i
            ));
        }
        let mut text = String::new();
        for chunk in body.as_bytes().chunks(13) {
            for frame in decoder.feed(chunk) {
                text.push_str(frame.text().unwrap_or_default());
            }
        }
        let expected: String = (0..20).map(|i| format!("{} ", i)).collect();
        assert_eq!(text, expected);
    }
}
