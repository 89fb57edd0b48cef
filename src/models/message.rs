use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::parse_backend_timestamp;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// The backend stores assistant turns with role `ai`.
    #[serde(alias = "ai")]
    Assistant,
}

impl Role {
    /// Parse a backend role string, accepting both `ai` and `assistant`.
    pub fn from_backend(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Role::User),
            "ai" | "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A finished conversation turn.
///
/// Messages are immutable once appended to a transcript; a transcript is
/// ordered by completion, not by when the request was issued.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One record from `GET /chat/{session_id}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub role: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl HistoryRecord {
    /// Convert to a client message. Returns None for roles we do not render.
    pub fn into_message(self) -> Option<Message> {
        let role = Role::from_backend(&self.role)?;
        let timestamp = self
            .created_at
            .as_deref()
            .and_then(parse_backend_timestamp)
            .unwrap_or_else(Utc::now);
        Some(Message {
            role,
            text: self.message.unwrap_or_default(),
            timestamp,
        })
    }
}

/// Body of `GET /chat/{session_id}`.
///
/// The backend answers with a bare array, or with a status object when the
/// session has no stored messages yet.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum HistoryResponse {
    Records(Vec<HistoryRecord>),
    Status {
        status: String,
        #[serde(default)]
        message: Option<String>,
    },
}

impl HistoryResponse {
    pub fn into_records(self) -> Vec<HistoryRecord> {
        match self {
            HistoryResponse::Records(records) => records,
            HistoryResponse::Status { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_backend() {
        assert_eq!(Role::from_backend("user"), Some(Role::User));
        assert_eq!(Role::from_backend("ai"), Some(Role::Assistant));
        assert_eq!(Role::from_backend("assistant"), Some(Role::Assistant));
        assert_eq!(Role::from_backend("system"), None);
    }

    #[test]
    fn test_role_deserialize_alias() {
        let role: Role = serde_json::from_str("\"ai\"").unwrap();
        assert_eq!(role, Role::Assistant);
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn test_history_array() {
        let json = r#"[
            {"role": "user", "message": "Can my landlord keep the deposit?", "created_at": "2024-05-01T10:00:00.123456"},
            {"role": "ai", "message": "It depends on the lease.", "created_at": "2024-05-01T10:00:00.123456"}
        ]"#;
        let response: HistoryResponse = serde_json::from_str(json).unwrap();
        let messages: Vec<Message> = response
            .into_records()
            .into_iter()
            .filter_map(HistoryRecord::into_message)
            .collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text, "It depends on the lease.");
        assert_eq!(messages[0].timestamp.to_rfc3339(), "2024-05-01T10:00:00.123456+00:00");
    }

    #[test]
    fn test_history_status_object_is_empty() {
        let json = r#"{"status": "error", "message": "No chat history found for this session."}"#;
        let response: HistoryResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_records().is_empty());
    }

    #[test]
    fn test_unknown_role_is_skipped() {
        let record = HistoryRecord {
            role: "tool".to_string(),
            message: Some("x".to_string()),
            created_at: None,
        };
        assert!(record.into_message().is_none());
    }
}
