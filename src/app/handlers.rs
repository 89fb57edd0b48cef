//! Handling of inbound frames, background results and the quiescence timer.

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{App, AppEvent, AppMessage, UploadTicket};
use crate::error::LexResult;
use crate::frame::Frame;
use crate::models::{Message, SessionEntry, SessionId, NEW_SESSION_TITLE};
use crate::turn::LiveTurn;
use crate::upload::UploadOutcome;
use crate::websocket::{ChatControl, ChatFrame};

impl App {
    /// Handle the result of background work.
    pub fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::UploadContent { ticket, text } => {
                if !self.is_current_upload(ticket) {
                    return;
                }
                match self.upload_live.as_mut() {
                    Some(turn) => {
                        turn.assembler.push_fragment(&text, Instant::now());
                        self.emit(AppEvent::Fragment(text));
                    }
                    None => debug!("Upload fragment for a discarded buffer"),
                }
            }
            AppMessage::UploadStatus {
                ticket, message, ..
            } => {
                if self.is_current_upload(ticket) {
                    self.emit(AppEvent::Status(message));
                }
            }
            AppMessage::UploadFinished { ticket, result } => {
                let upload = match self.upload.take() {
                    Some(upload) if upload.id == ticket => upload,
                    other => {
                        warn!("Completion for unknown upload #{}", ticket);
                        self.upload = other;
                        return;
                    }
                };
                self.finish_upload(upload, result);
            }
            AppMessage::HistoryLoaded { session_id, result } => {
                if !self.register.is_current(&session_id) {
                    debug!("Dropping stale history for {}", session_id);
                    return;
                }
                match result {
                    Ok(messages) => {
                        info!("Loaded {} messages for {}", messages.len(), session_id);
                        self.transcript = messages;
                        self.emit(AppEvent::Transcript(self.transcript.clone()));
                    }
                    Err(e) => {
                        warn!("Failed to load history for {}: {}", session_id, e);
                        self.emit(AppEvent::Error(e.user_message()));
                    }
                }
            }
            AppMessage::SessionsLoaded(result) => match result {
                Ok(entries) => {
                    // A list fetched before a confirmation landed may not know
                    // the current session or a locally minted upload entry yet
                    let keep: Vec<SessionEntry> = [
                        self.upload.as_ref().and_then(|upload| upload.pending.as_ref()),
                        self.register.current(),
                    ]
                    .into_iter()
                    .flatten()
                    .filter(|id| !entries.iter().any(|entry| &entry.id == *id))
                    .filter_map(|id| self.catalog.get(id).cloned())
                    .collect();

                    self.catalog.replace_all(entries);
                    for entry in keep.into_iter().rev() {
                        self.catalog.upsert_new(entry);
                    }
                    self.emit_catalog();
                    self.emit(AppEvent::SessionsRefreshed(self.catalog.entries().to_vec()));
                }
                Err(e) => {
                    warn!("Failed to load sessions: {}", e);
                    self.emit(AppEvent::Error(e.user_message()));
                }
            },
        }
    }

    /// Handle one decoded chat frame received at `now`.
    pub fn handle_chat_frame(&mut self, frame: ChatFrame, now: Instant) {
        if self.chat_muted {
            debug!("Dropping chat frame from an abandoned conversation: {:?}", frame);
            return;
        }
        match frame {
            Frame::Control(control) => self.apply_chat_control(control),
            Frame::Content(text) | Frame::Literal(text) => self.push_chat_fragment(&text, now),
        }
    }

    /// Commit the chat buffer if its quiescence deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        let Some(turn) = self.chat_live.as_mut() else {
            return;
        };

        let committed = turn.assembler.poll(now);
        if turn.assembler.is_idle() {
            self.chat_live = None;
        }
        if let Some(text) = committed {
            debug!("Chat turn quiescent, committing {} chars", text.len());
            self.append(Message::assistant(text));
        }
    }

    fn push_chat_fragment(&mut self, text: &str, now: Instant) {
        if text.is_empty() {
            return;
        }

        let window = self.config.quiescence_window;
        let turn = self.chat_live.get_or_insert_with(|| {
            debug!("Chat fragment without an outstanding turn, starting one");
            LiveTurn::chat(window)
        });
        turn.assembler.push_fragment(text, now);
        self.emit(AppEvent::Fragment(text.to_string()));
    }

    fn apply_chat_control(&mut self, control: ChatControl) {
        if let Some(info) = control.info {
            self.emit(AppEvent::Status(info));
        }

        match control.session_id {
            Some(id) if !id.as_str().is_empty() => {
                let in_flight = self.chat_turn_session.take();
                self.apply_confirmation(in_flight, id.clone(), control.title.as_deref());
                self.chat_turn_session = Some(id);
            }
            _ => {
                let current = self.register.current().cloned();
                if let (Some(title), Some(current)) = (control.title, current) {
                    if self.catalog.patch_title_if_default(&current, &title) {
                        self.emit_catalog();
                    }
                }
            }
        }
    }

    /// Adopt an identity the backend asserted and bring the catalog in line.
    ///
    /// `in_flight` is the identity the request was made under. If it differs
    /// from `confirmed`, its catalog entry is rewritten (or merged) into the
    /// confirmed one.
    pub(crate) fn apply_confirmation(
        &mut self,
        in_flight: Option<SessionId>,
        confirmed: SessionId,
        title: Option<&str>,
    ) {
        let previous = self.register.adopt(confirmed.clone());
        self.reconcile_catalog(in_flight.as_ref(), &confirmed);
        if let Some(title) = title {
            self.catalog.patch_title_if_default(&confirmed, title);
        }

        if previous.as_ref() != Some(&confirmed) {
            self.emit(AppEvent::SessionChanged(Some(confirmed)));
        }
        self.emit_catalog();
    }

    fn reconcile_catalog(&mut self, old: Option<&SessionId>, confirmed: &SessionId) {
        if let Some(old) = old {
            if old != confirmed && self.catalog.reconcile_id(old, confirmed) {
                return;
            }
        }
        if !self.catalog.contains(confirmed) {
            self.catalog
                .upsert_new(SessionEntry::new(confirmed.clone(), NEW_SESSION_TITLE));
        }
    }

    fn is_current_upload(&self, ticket: u64) -> bool {
        matches!(&self.upload, Some(upload) if upload.id == ticket && upload.epoch == self.epoch)
    }

    fn finish_upload(&mut self, upload: UploadTicket, result: LexResult<UploadOutcome>) {
        let current = upload.epoch == self.epoch;
        // A conversation switch already discarded the buffer of a stale upload
        let live = self.upload_live.take();

        match result {
            Ok(outcome) => {
                if let Some(text) = live.and_then(|mut turn| turn.assembler.finish()) {
                    self.append(Message::assistant(text));
                }

                match outcome.confirmed {
                    Some(confirmed) if current => {
                        self.apply_confirmation(upload.local_identity(), confirmed, None);
                    }
                    Some(confirmed) => {
                        // The user moved on; only the catalog learns about it
                        self.reconcile_catalog(upload.pending.as_ref(), &confirmed);
                        self.emit_catalog();
                    }
                    None => {
                        if let Some(pending) = upload.pending.as_ref() {
                            debug!("Upload never confirmed a session, dropping {}", pending);
                            self.catalog.remove(pending);
                            self.emit_catalog();
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Upload failed: {}", e);
                if let Some(mut turn) = live {
                    turn.assembler.discard();
                }
                if let Some(pending) = upload.pending.as_ref() {
                    self.catalog.remove(pending);
                    self.emit_catalog();
                }
                self.emit(AppEvent::Error(e.user_message()));
            }
        }
    }
}
