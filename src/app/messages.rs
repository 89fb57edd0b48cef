//! Messages flowing into and out of the App.

use std::path::PathBuf;

use crate::error::LexResult;
use crate::models::{Message, SessionEntry, SessionId};
use crate::upload::UploadOutcome;

/// Results of background work, delivered back to the App's task.
#[derive(Debug, Clone)]
pub enum AppMessage {
    /// A summary fragment from the running upload
    UploadContent { ticket: u64, text: String },
    /// A progress notification from the running upload
    UploadStatus {
        ticket: u64,
        status: String,
        message: String,
    },
    /// The upload stream ended or failed
    UploadFinished {
        ticket: u64,
        result: LexResult<UploadOutcome>,
    },
    /// History for a selected session arrived
    HistoryLoaded {
        session_id: SessionId,
        result: LexResult<Vec<Message>>,
    },
    /// The session list arrived
    SessionsLoaded(LexResult<Vec<SessionEntry>>),
}

/// What the front end should show.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A finished turn was appended to the transcript
    MessageAppended(Message),
    /// Text was appended to the live buffer
    Fragment(String),
    /// A status notification (upload progress, chat info)
    Status(String),
    /// A user-visible error
    Error(String),
    /// The current session identity changed
    SessionChanged(Option<SessionId>),
    /// The session catalog changed
    CatalogUpdated(Vec<SessionEntry>),
    /// A requested session list fetch completed; carries the merged catalog
    SessionsRefreshed(Vec<SessionEntry>),
    /// The whole transcript was replaced (history load, new conversation)
    Transcript(Vec<Message>),
}

/// Actions the user can take.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Send a chat turn
    Send(String),
    /// Upload a document for summarization
    Upload(PathBuf),
    /// Start a fresh conversation
    NewConversation,
    /// Switch to a session from the catalog
    SelectSession(SessionId),
    /// Re-fetch the session list
    RefreshSessions,
    /// Re-emit the catalog without fetching
    ListSessions,
    /// Re-emit the current transcript
    ShowTranscript,
    /// Close the chat connection and stop
    Shutdown,
}
