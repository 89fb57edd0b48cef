//! WebSocket connector trait abstraction.
//!
//! The chat supervisor owns the connection lifecycle; the connector only
//! knows how to open one socket and hand back its two halves. Keeping the
//! seam this narrow lets the reconnect and close-code logic run against
//! [`crate::adapters::mock::MockConnector`] in tests.

use async_trait::async_trait;
use futures::{Sink, Stream};
use std::pin::Pin;

use crate::error::TransportError;
use crate::websocket::messages::SocketEvent;

/// Frames the supervisor writes to a socket.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    /// A text message
    Text(String),
    /// A close frame carrying the normal close code
    Close,
}

/// Write half of a chat socket.
pub type SocketSink = Pin<Box<dyn Sink<OutboundFrame, Error = TransportError> + Send>>;

/// Read half of a chat socket.
pub type SocketStream = Pin<Box<dyn Stream<Item = SocketEvent> + Send>>;

/// An opened socket, split into halves.
pub struct SocketPair {
    pub sink: SocketSink,
    pub stream: SocketStream,
}

/// Trait for opening chat sockets.
#[async_trait]
pub trait WsConnector: Send + Sync {
    /// Open one connection to `url`.
    async fn connect(&self, url: &str) -> Result<SocketPair, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_frame_equality() {
        assert_eq!(
            OutboundFrame::Text("a".to_string()),
            OutboundFrame::Text("a".to_string())
        );
        assert_ne!(OutboundFrame::Text("a".to_string()), OutboundFrame::Close);
    }
}
