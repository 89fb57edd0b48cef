//! Data models for conversations, sessions and backend payloads.

mod file;
mod message;
mod session;

pub use file::UploadFile;
pub use message::{HistoryRecord, HistoryResponse, Message, Role};
pub use session::{
    is_placeholder_title, normalize_title, SessionEntry, SessionId, SessionsResponse,
    BACKEND_FALLBACK_TITLE, NEW_SESSION_TITLE, PLACEHOLDER_TITLES,
};

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a timestamp as written by the backend.
///
/// The backend stores naive UTC ISO-8601 strings (no offset); RFC 3339 with
/// an offset is accepted too.
pub fn parse_backend_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
