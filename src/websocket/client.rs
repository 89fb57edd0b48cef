use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::messages::{ChatControl, ChatRequest, CloseKind, SocketEvent};
use crate::error::{DecodeError, LexError, LexResult};
use crate::frame::{decode_chat_frame, Frame};
use crate::traits::{OutboundFrame, SocketPair, WsConnector};

/// A decoded inbound chat frame.
pub type ChatFrame = Frame<ChatControl>;

const FRAME_CHANNEL_CAPACITY: usize = 100;

/// Chat connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

/// Handle to the running connection task.
struct Driver {
    outbound_tx: mpsc::UnboundedSender<String>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the chat websocket.
///
/// Only the background connection task ever touches the socket; everything
/// else talks to it through this handle. Involuntary closes (any close code
/// other than 1000, a transport error, or the stream just ending) schedule a
/// reconnect after `reconnect_delay`, forever, until [`disconnect`] is called
/// or the server closes normally.
///
/// [`disconnect`]: ChannelSupervisor::disconnect
pub struct ChannelSupervisor {
    connector: Arc<dyn WsConnector>,
    url: String,
    reconnect_delay: Duration,
    state_tx: Arc<watch::Sender<ConnectionState>>,
    frames_tx: mpsc::Sender<ChatFrame>,
    driver: Mutex<Option<Driver>>,
    reconnects: Arc<AtomicU32>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ChannelSupervisor {
    /// Create a supervisor. Nothing connects until [`connect`](Self::connect).
    ///
    /// Returns the receiver for decoded inbound frames.
    pub fn new(
        connector: Arc<dyn WsConnector>,
        url: impl Into<String>,
        reconnect_delay: Duration,
    ) -> (Self, mpsc::Receiver<ChatFrame>) {
        let (frames_tx, frames_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        let supervisor = Self {
            connector,
            url: url.into(),
            reconnect_delay,
            state_tx: Arc::new(state_tx),
            frames_tx,
            driver: Mutex::new(None),
            reconnects: Arc::new(AtomicU32::new(0)),
        };
        (supervisor, frames_rx)
    }

    /// Start the connection task.
    ///
    /// A no-op while a task is already running, whether it is connected,
    /// connecting, or waiting to reconnect. Must be called within a tokio
    /// runtime.
    pub fn connect(&self) {
        let mut slot = lock(&self.driver);
        if let Some(driver) = slot.as_ref() {
            if !driver.handle.is_finished() {
                debug!("Chat connection already running, ignoring connect");
                return;
            }
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let ctx = LoopContext {
            connector: Arc::clone(&self.connector),
            url: self.url.clone(),
            reconnect_delay: self.reconnect_delay,
            state_tx: Arc::clone(&self.state_tx),
            frames_tx: self.frames_tx.clone(),
            reconnects: Arc::clone(&self.reconnects),
        };

        let handle = tokio::spawn(run_connection_loop(ctx, outbound_rx, shutdown_rx));

        *slot = Some(Driver {
            outbound_tx,
            shutdown_tx,
            handle,
        });
    }

    /// Close the connection with the normal close code and stop reconnecting.
    pub async fn disconnect(&self) {
        let driver = lock(&self.driver).take();
        if let Some(driver) = driver {
            info!("Closing chat connection");
            driver.shutdown_tx.send_replace(true);
            if let Err(e) = driver.handle.await {
                warn!("Chat connection task ended abnormally: {}", e);
            }
        }
        self.state_tx.send_replace(ConnectionState::Disconnected);
    }

    /// Send one chat turn.
    ///
    /// Fails with [`LexError::NotConnected`] unless the socket is open.
    pub fn send(&self, request: &ChatRequest) -> LexResult<()> {
        if self.state() != ConnectionState::Open {
            return Err(LexError::NotConnected);
        }

        let payload = request.to_json().map_err(DecodeError::from)?;
        let slot = lock(&self.driver);
        let driver = slot.as_ref().ok_or(LexError::NotConnected)?;
        driver
            .outbound_tx
            .send(payload)
            .map_err(|_| LexError::NotConnected)?;
        debug!("Queued chat request (session: {:?})", request.session_id);
        Ok(())
    }

    /// Send after giving a cold connection up to `grace` to open.
    ///
    /// Starts the connection task if none is running. Still fails with
    /// [`LexError::NotConnected`] when the socket is not open in time.
    pub async fn send_when_ready(&self, request: &ChatRequest, grace: Duration) -> LexResult<()> {
        if self.state() != ConnectionState::Open {
            self.connect();
            let mut state_rx = self.subscribe();
            let opened = matches!(
                tokio::time::timeout(
                    grace,
                    state_rx.wait_for(|state| *state == ConnectionState::Open)
                )
                .await,
                Ok(Ok(_))
            );
            if !opened {
                warn!("Chat connection did not open within {:?}", grace);
            }
        }
        self.send(request)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Subscribe to connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Number of reconnects scheduled so far.
    pub fn reconnect_count(&self) -> u32 {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for ChannelSupervisor {
    fn drop(&mut self) {
        if let Some(driver) = lock(&self.driver).as_ref() {
            driver.shutdown_tx.send_replace(true);
        }
    }
}

/// Everything the connection task needs, detached from the handle.
struct LoopContext {
    connector: Arc<dyn WsConnector>,
    url: String,
    reconnect_delay: Duration,
    state_tx: Arc<watch::Sender<ConnectionState>>,
    frames_tx: mpsc::Sender<ChatFrame>,
    reconnects: Arc<AtomicU32>,
}

impl LoopContext {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!("Chat connection state: {:?} -> {:?}", previous, state);
        }
    }
}

/// Why a connected socket stopped being pumped.
enum PumpExit {
    /// Closed by us or with the normal close code.
    Voluntary,
    /// Anything else; schedule a reconnect.
    Involuntary(String),
    /// Nobody is reading frames any more.
    ReaderGone,
}

async fn run_connection_loop(
    ctx: LoopContext,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        ctx.set_state(ConnectionState::Connecting);
        let result = tokio::select! {
            result = ctx.connector.connect(&ctx.url) => result,
            _ = shutdown_rx.changed() => break,
        };

        match result {
            Ok(pair) => {
                // Requests queued for a socket that has since died are not replayed
                let mut stale = 0usize;
                while outbound_rx.try_recv().is_ok() {
                    stale += 1;
                }
                if stale > 0 {
                    debug!("Dropped {} chat requests queued before reconnect", stale);
                }

                info!("Chat connection open: {}", ctx.url);
                ctx.set_state(ConnectionState::Open);

                match pump(&ctx, pair, &mut outbound_rx, &mut shutdown_rx).await {
                    PumpExit::Voluntary => break,
                    PumpExit::ReaderGone => {
                        warn!("Chat frame receiver dropped, shutting down connection");
                        break;
                    }
                    PumpExit::Involuntary(reason) => {
                        warn!("Chat connection lost: {}", reason);
                    }
                }
            }
            Err(e) => {
                warn!("Chat connection to {} failed: {}", ctx.url, e);
            }
        }

        ctx.set_state(ConnectionState::Disconnected);
        let attempt = ctx.reconnects.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "Reconnecting chat in {:?} (reconnect #{})",
            ctx.reconnect_delay, attempt
        );

        tokio::select! {
            _ = tokio::time::sleep(ctx.reconnect_delay) => {}
            _ = shutdown_rx.changed() => {
                debug!("Shutdown requested during reconnect delay");
                break;
            }
        }
    }

    ctx.set_state(ConnectionState::Disconnected);
    info!("Chat connection loop ended");
}

async fn pump(
    ctx: &LoopContext,
    pair: SocketPair,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> PumpExit {
    let SocketPair {
        mut sink,
        mut stream,
    } = pair;

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                ctx.set_state(ConnectionState::Closing);
                if let Err(e) = sink.send(OutboundFrame::Close).await {
                    debug!("Failed to send close frame: {}", e);
                }
                return PumpExit::Voluntary;
            }

            event = stream.next() => match event {
                Some(SocketEvent::Text(text)) => {
                    let frame = decode_chat_frame(&text);
                    if ctx.frames_tx.send(frame).await.is_err() {
                        return PumpExit::ReaderGone;
                    }
                }
                Some(SocketEvent::Closed(CloseKind::Normal)) => {
                    info!("Chat connection closed normally");
                    return PumpExit::Voluntary;
                }
                Some(SocketEvent::Closed(CloseKind::Abnormal(code))) => {
                    return PumpExit::Involuntary(match code {
                        Some(code) => format!("closed with code {}", code),
                        None => "closed without a close code".to_string(),
                    });
                }
                Some(SocketEvent::Error(message)) => {
                    return PumpExit::Involuntary(message);
                }
                None => {
                    return PumpExit::Involuntary("stream ended".to_string());
                }
            },

            Some(payload) = outbound_rx.recv() => {
                if let Err(e) = sink.send(OutboundFrame::Text(payload)).await {
                    return PumpExit::Involuntary(format!("send failed: {}", e));
                }
            }
        }
    }
}
