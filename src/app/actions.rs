//! User-initiated actions.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{App, AppEvent, AppMessage, UploadTicket, UserCommand};
use crate::error::{LexError, LexResult};
use crate::models::{Message, SessionEntry, SessionId, UploadFile, NEW_SESSION_TITLE};
use crate::turn::LiveTurn;
use crate::upload::{UploadObserver, UploadSession};
use crate::websocket::ChatRequest;

/// Prefix of locally minted session ids.
pub const PENDING_ID_PREFIX: &str = "pending-";

/// Forwards upload events to the App's task.
struct ChannelObserver {
    ticket: u64,
    tx: mpsc::UnboundedSender<AppMessage>,
}

impl UploadObserver for ChannelObserver {
    fn on_content(&mut self, text: &str) {
        let _ = self.tx.send(AppMessage::UploadContent {
            ticket: self.ticket,
            text: text.to_string(),
        });
    }

    fn on_status(&mut self, status: &str, message: &str) {
        let _ = self.tx.send(AppMessage::UploadStatus {
            ticket: self.ticket,
            status: status.to_string(),
            message: message.to_string(),
        });
    }
}

impl App {
    /// Execute a user command. Failures are reported as [`AppEvent::Error`].
    pub async fn handle_command(&mut self, command: UserCommand) {
        let result = match command {
            UserCommand::Send(text) => self.submit_chat(&text).await,
            UserCommand::Upload(path) => self.upload_path(&path).await,
            UserCommand::NewConversation => {
                self.new_conversation();
                Ok(())
            }
            UserCommand::SelectSession(id) => {
                self.select_session(id);
                Ok(())
            }
            UserCommand::RefreshSessions => {
                self.refresh_sessions();
                Ok(())
            }
            UserCommand::ListSessions => {
                self.emit_catalog();
                Ok(())
            }
            UserCommand::ShowTranscript => {
                self.emit(AppEvent::Transcript(self.transcript.clone()));
                Ok(())
            }
            UserCommand::Shutdown => {
                self.supervisor.disconnect().await;
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("Command failed [{}/{}]: {}", e.category(), e.error_code(), e);
            self.emit(AppEvent::Error(e.user_message()));
        }
    }

    /// Send a chat turn under the current session identity.
    ///
    /// Waits up to the configured grace period for a cold connection. The
    /// user message is only appended once the request is on its way.
    pub async fn submit_chat(&mut self, text: &str) -> LexResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        if self.upload.is_some() {
            return Err(LexError::UploadInProgress);
        }

        self.settle_live_turn();

        let session = self.register.resolve_for_request();
        let request = ChatRequest::new(text, session.clone());
        self.supervisor
            .send_when_ready(&request, self.config.send_grace_period)
            .await?;

        self.append(Message::user(text));
        self.chat_turn_session = session;
        self.chat_muted = false;
        self.chat_live = Some(LiveTurn::chat(self.config.quiescence_window));
        Ok(())
    }

    /// Read a file from disk and upload it.
    pub async fn upload_path(&mut self, path: &Path) -> LexResult<()> {
        if self.upload.is_some() {
            return Err(LexError::UploadInProgress);
        }
        let file = UploadFile::from_path(path).await?;
        self.start_upload(file)?;
        Ok(())
    }

    /// Start uploading `file` in the background.
    ///
    /// Without a current session a placeholder catalog entry is minted and
    /// later rewritten to whatever id the backend confirms.
    pub fn start_upload(&mut self, file: UploadFile) -> LexResult<u64> {
        if self.upload.is_some() {
            return Err(LexError::UploadInProgress);
        }

        let known = self.register.resolve_for_request();
        let pending = if known.is_none() {
            let id = SessionId::new(format!("{}{}", PENDING_ID_PREFIX, Uuid::new_v4()));
            self.catalog
                .upsert_new(SessionEntry::new(id.clone(), NEW_SESSION_TITLE));
            self.emit_catalog();
            Some(id)
        } else {
            None
        };

        self.next_ticket += 1;
        let ticket = UploadTicket {
            id: self.next_ticket,
            epoch: self.epoch,
            known: known.clone(),
            pending,
        };
        let ticket_id = ticket.id;
        self.upload = Some(ticket);

        info!("Uploading {} ({})", file.file_name, file.format_size());
        self.append(Message::user(format!("Uploaded document: {}", file.file_name)));
        self.upload_live = Some(LiveTurn::upload());

        let backend = Arc::clone(&self.backend);
        let tx = self.message_tx.clone();
        tokio::spawn(async move {
            let mut observer = ChannelObserver {
                ticket: ticket_id,
                tx: tx.clone(),
            };
            let result = UploadSession::new(&backend)
                .run(&file, known.as_ref(), &mut observer)
                .await;
            let _ = tx.send(AppMessage::UploadFinished {
                ticket: ticket_id,
                result,
            });
        });

        Ok(ticket_id)
    }

    /// Switch to a session from the catalog and load its history.
    pub fn select_session(&mut self, id: SessionId) {
        self.epoch += 1;
        self.chat_muted = true;
        self.discard_live_turn();
        self.transcript.clear();
        self.chat_turn_session = None;

        let previous = self.register.adopt(id.clone());
        if previous.as_ref() != Some(&id) {
            self.emit(AppEvent::SessionChanged(Some(id.clone())));
        }
        self.emit(AppEvent::Transcript(Vec::new()));

        let backend = Arc::clone(&self.backend);
        let tx = self.message_tx.clone();
        tokio::spawn(async move {
            let result = backend.fetch_history(&id).await;
            let _ = tx.send(AppMessage::HistoryLoaded {
                session_id: id,
                result,
            });
        });
    }

    /// Forget the current session; the next request starts a new one.
    pub fn new_conversation(&mut self) {
        self.epoch += 1;
        self.chat_muted = true;
        self.discard_live_turn();
        self.transcript.clear();
        self.chat_turn_session = None;

        if self.register.clear().is_some() {
            self.emit(AppEvent::SessionChanged(None));
        }
        self.emit(AppEvent::Transcript(Vec::new()));
    }

    /// Fetch the session list in the background.
    pub fn refresh_sessions(&self) {
        let backend = Arc::clone(&self.backend);
        let tx = self.message_tx.clone();
        tokio::spawn(async move {
            let result = backend.fetch_sessions().await;
            let _ = tx.send(AppMessage::SessionsLoaded(result));
        });
    }

    /// Close out the chat buffer before a new chat request replaces it.
    ///
    /// Text already received is committed; a turn that never received
    /// anything is dropped.
    fn settle_live_turn(&mut self) {
        let Some(mut turn) = self.chat_live.take() else {
            return;
        };
        if let Some(text) = turn.assembler.finish() {
            debug!("Committing chat turn early for a new request");
            self.append(Message::assistant(text));
        }
    }

    /// Drop both live buffers without committing them.
    fn discard_live_turn(&mut self) {
        for mut turn in [self.chat_live.take(), self.upload_live.take()]
            .into_iter()
            .flatten()
        {
            debug!("Discarding live {:?} buffer", turn.origin);
            turn.assembler.discard();
        }
    }
}
