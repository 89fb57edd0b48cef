//! Chat channel wire types.

use serde::{Deserialize, Serialize};

use crate::models::SessionId;

/// Outbound chat turn: `{"query": ..., "session_id": ... | null}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    /// Always serialized; `null` asks the backend to mint a session.
    pub session_id: Option<SessionId>,
}

impl ChatRequest {
    pub fn new(query: impl Into<String>, session_id: Option<SessionId>) -> Self {
        Self {
            query: query.into(),
            session_id,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Inbound control frame on the chat channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatControl {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub title: Option<String>,
    /// Human-readable notice such as "New session created"
    #[serde(default)]
    pub info: Option<String>,
}

/// How a websocket close was initiated, from the supervisor's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// Closed with the normal close code (1000). Never reconnected.
    Normal,
    /// Any other close code, or none at all.
    Abnormal(Option<u16>),
}

/// Close code for a normal, intentional closure.
pub const NORMAL_CLOSE_CODE: u16 = 1000;

impl CloseKind {
    pub fn from_code(code: Option<u16>) -> Self {
        match code {
            Some(NORMAL_CLOSE_CODE) => CloseKind::Normal,
            other => CloseKind::Abnormal(other),
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, CloseKind::Normal)
    }
}

/// Transport-level events read from a chat socket.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    /// A text (or UTF-8 decoded binary) message
    Text(String),
    /// The peer closed the connection
    Closed(CloseKind),
    /// The socket failed; treated as an abnormal close
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_null_session() {
        let json = ChatRequest::new("Is a verbal contract binding?", None)
            .to_json()
            .unwrap();
        assert_eq!(
            json,
            r#"{"query":"Is a verbal contract binding?","session_id":null}"#
        );
    }

    #[test]
    fn test_chat_request_with_session() {
        let json = ChatRequest::new("follow-up", Some(SessionId::new("S1")))
            .to_json()
            .unwrap();
        assert_eq!(json, r#"{"query":"follow-up","session_id":"S1"}"#);
    }

    #[test]
    fn test_close_kind_from_code() {
        assert_eq!(CloseKind::from_code(Some(1000)), CloseKind::Normal);
        assert_eq!(CloseKind::from_code(Some(1006)), CloseKind::Abnormal(Some(1006)));
        assert_eq!(CloseKind::from_code(None), CloseKind::Abnormal(None));
        assert!(CloseKind::Normal.is_normal());
    }

    #[test]
    fn test_chat_control_ignores_unknown_fields() {
        let control: ChatControl =
            serde_json::from_str(r#"{"session_id": "S1", "extra": 1}"#).unwrap();
        assert_eq!(control.session_id, Some(SessionId::new("S1")));
    }
}
