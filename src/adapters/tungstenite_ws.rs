//! Tungstenite-based WebSocket connector.
//!
//! Opens a socket with `tokio-tungstenite` and adapts its message types to
//! the supervisor's [`OutboundFrame`] / [`SocketEvent`] vocabulary.

use async_trait::async_trait;
use futures_util::{future, SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::traits::{OutboundFrame, SocketPair, WsConnector};
use crate::websocket::messages::{CloseKind, SocketEvent};

/// WebSocket connector using tokio-tungstenite.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self
    }
}

fn to_message(frame: OutboundFrame) -> Message {
    match frame {
        OutboundFrame::Text(text) => Message::Text(text),
        OutboundFrame::Close => Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        })),
    }
}

fn to_event(message: Message) -> Option<SocketEvent> {
    match message {
        Message::Text(text) => Some(SocketEvent::Text(text)),
        Message::Binary(data) => Some(SocketEvent::Text(
            String::from_utf8_lossy(&data).into_owned(),
        )),
        Message::Close(frame) => {
            let code = frame.map(|f| u16::from(f.code));
            debug!("Received close frame with code {:?}", code);
            Some(SocketEvent::Closed(CloseKind::from_code(code)))
        }
        // Pings are answered by tungstenite itself
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}

#[async_trait]
impl WsConnector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<SocketPair, TransportError> {
        let (ws_stream, _) =
            connect_async(url)
                .await
                .map_err(|e| TransportError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        info!("Connected to chat websocket at {}", url);

        let (ws_sink, ws_stream) = ws_stream.split();

        let sink = ws_sink
            .sink_map_err(|e| TransportError::Stream {
                message: e.to_string(),
            })
            .with(|frame: OutboundFrame| future::ready(Ok::<_, TransportError>(to_message(frame))));

        let stream = ws_stream.filter_map(|result| {
            future::ready(match result {
                Ok(message) => to_event(message),
                Err(e) => Some(SocketEvent::Error(e.to_string())),
            })
        });

        Ok(SocketPair {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}
