//! Application controller.
//!
//! [`App`] wires the components together and owns everything that changes
//! over a conversation: the transcript, the live buffers, the session
//! register and the catalog. The chat channel and the upload stream each
//! have their own live buffer, since both may be streaming at once. All of
//! it is mutated from the single task that runs [`App::run`]. Chat frames, upload events, fetch results and the
//! quiescence timer are all funnelled into that task, so no two mutations
//! ever interleave.
//!
//! - [`AppMessage`] - results of background work
//! - [`AppEvent`] - what the front end should show
//! - [`UserCommand`] - what the user asked for

mod actions;
mod handlers;
mod messages;


pub use messages::{AppEvent, AppMessage, UserCommand};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::backend::BackendClient;
use crate::cache::SessionCatalog;
use crate::config::ClientConfig;
use crate::models::{Message, SessionId};
use crate::state::SessionRegister;
use crate::traits::WsConnector;
use crate::turn::{LiveTurn, TurnOrigin};
use crate::websocket::{ChannelSupervisor, ChatFrame};

/// Bookkeeping for the upload in flight.
#[derive(Debug, Clone)]
pub(crate) struct UploadTicket {
    pub(crate) id: u64,
    /// Conversation epoch the upload was started in
    pub(crate) epoch: u64,
    /// Session id sent with the request
    pub(crate) known: Option<SessionId>,
    /// Locally minted catalog entry awaiting confirmation
    pub(crate) pending: Option<SessionId>,
}

impl UploadTicket {
    /// The identity the request was made under, real or local.
    pub(crate) fn local_identity(&self) -> Option<SessionId> {
        self.pending.clone().or_else(|| self.known.clone())
    }
}

/// The conversational client.
pub struct App {
    pub(crate) config: ClientConfig,
    pub(crate) backend: Arc<BackendClient>,
    pub(crate) supervisor: ChannelSupervisor,
    pub(crate) register: SessionRegister,
    pub(crate) catalog: SessionCatalog,
    pub(crate) transcript: Vec<Message>,
    /// Reply streaming in on the chat channel
    pub(crate) chat_live: Option<LiveTurn>,
    /// Summary streaming in from the running upload
    pub(crate) upload_live: Option<LiveTurn>,
    /// Session id the outstanding chat turn was sent with
    pub(crate) chat_turn_session: Option<SessionId>,
    /// Set when the user leaves a conversation; chat frames are dropped
    /// until the next request so a late reply cannot leak into the new one
    pub(crate) chat_muted: bool,
    pub(crate) upload: Option<UploadTicket>,
    pub(crate) next_ticket: u64,
    /// Bumped whenever the user switches conversation
    pub(crate) epoch: u64,
    pub(crate) message_tx: mpsc::UnboundedSender<AppMessage>,
    message_rx: Option<mpsc::UnboundedReceiver<AppMessage>>,
    chat_rx: Option<mpsc::Receiver<ChatFrame>>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    /// Create the App. Returns the receiver the front end reads events from.
    pub fn new(
        config: ClientConfig,
        backend: Arc<BackendClient>,
        connector: Arc<dyn WsConnector>,
    ) -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (supervisor, chat_rx) =
            ChannelSupervisor::new(connector, config.ws_url.clone(), config.reconnect_delay);
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let app = Self {
            config,
            backend,
            supervisor,
            register: SessionRegister::new(),
            catalog: SessionCatalog::new(),
            transcript: Vec::new(),
            chat_live: None,
            upload_live: None,
            chat_turn_session: None,
            chat_muted: false,
            upload: None,
            next_ticket: 0,
            epoch: 0,
            message_tx,
            message_rx: Some(message_rx),
            chat_rx: Some(chat_rx),
            event_tx,
        };
        (app, event_rx)
    }

    /// Run until `Shutdown` or until the command sender is dropped.
    ///
    /// Connects the chat channel and fetches the session list first. The
    /// chat connection is closed normally on the way out.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<UserCommand>) {
        let (Some(mut chat_rx), Some(mut message_rx)) = (self.chat_rx.take(), self.message_rx.take())
        else {
            return;
        };

        self.supervisor.connect();
        self.refresh_sessions();

        loop {
            let deadline = self.turn_deadline();

            tokio::select! {
                command = commands.recv() => match command {
                    Some(UserCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },

                Some(frame) = chat_rx.recv() => {
                    self.handle_chat_frame(frame, Instant::now());
                }

                Some(message) = message_rx.recv() => {
                    self.handle_message(message);
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.tick(Instant::now());
                }
            }
        }

        info!("Shutting down");
        self.supervisor.disconnect().await;
    }

    /// Deadline of the live chat buffer, if one is counting down.
    pub fn turn_deadline(&self) -> Option<Instant> {
        self.chat_live
            .as_ref()
            .and_then(|turn| turn.assembler.deadline())
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    fn live(&self, origin: TurnOrigin) -> Option<&LiveTurn> {
        match origin {
            TurnOrigin::Chat => self.chat_live.as_ref(),
            TurnOrigin::Upload => self.upload_live.as_ref(),
        }
    }

    /// Text of the given live buffer, empty when there is none.
    pub fn live_text(&self, origin: TurnOrigin) -> &str {
        self.live(origin)
            .map(|turn| turn.assembler.live_text())
            .unwrap_or("")
    }

    pub fn has_live(&self, origin: TurnOrigin) -> bool {
        self.live(origin).is_some()
    }

    /// True while a chat turn is outstanding (sent or streaming).
    pub fn is_awaiting_response(&self) -> bool {
        self.chat_live.is_some()
    }

    pub fn upload_in_progress(&self) -> bool {
        self.upload.is_some()
    }

    pub fn current_session(&self) -> Option<&SessionId> {
        self.register.current()
    }

    pub fn register(&self) -> &SessionRegister {
        &self.register
    }

    pub fn catalog(&self) -> &SessionCatalog {
        &self.catalog
    }

    pub fn supervisor(&self) -> &ChannelSupervisor {
        &self.supervisor
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn emit(&self, event: AppEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }

    pub(crate) fn append(&mut self, message: Message) {
        self.transcript.push(message.clone());
        self.emit(AppEvent::MessageAppended(message));
    }

    pub(crate) fn emit_catalog(&self) {
        self.emit(AppEvent::CatalogUpdated(self.catalog.entries().to_vec()));
    }
}
