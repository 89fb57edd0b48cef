use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::parse_backend_timestamp;

/// Opaque conversation identity issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Title given to sessions minted locally before the backend names them.
pub const NEW_SESSION_TITLE: &str = "New Chat";

/// Title the backend falls back to when it cannot generate one.
pub const BACKEND_FALLBACK_TITLE: &str = "Untitled Session";

/// Titles that a later, more specific title may overwrite.
pub const PLACEHOLDER_TITLES: &[&str] = &[NEW_SESSION_TITLE, BACKEND_FALLBACK_TITLE];

/// Strip surrounding whitespace and quote characters from a title.
///
/// The backend's title generator sometimes wraps the title in quotes.
pub fn normalize_title(title: &str) -> String {
    title
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// True when the title is empty or one of the known placeholders.
pub fn is_placeholder_title(title: &str) -> bool {
    title.is_empty() || PLACEHOLDER_TITLES.contains(&title)
}

/// One entry of the session picker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntry {
    #[serde(rename = "session_id")]
    pub id: SessionId,
    #[serde(default)]
    pub title: String,
    #[serde(default = "Utc::now", deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Utc>,
}

impl SessionEntry {
    pub fn new(id: impl Into<SessionId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(parse_backend_timestamp)
        .unwrap_or_else(Utc::now))
}

/// Body of `GET /sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sessions: Vec<SessionEntry>,
}
