//! Mock WebSocket connector for testing.
//!
//! Every successful [`MockConnector::connect`] produces a [`MockSocket`]
//! handle that tests use to inject inbound events and inspect what the
//! supervisor wrote.

use async_trait::async_trait;
use futures::channel::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::TransportError;
use crate::traits::{OutboundFrame, SocketPair, WsConnector};
use crate::websocket::messages::{CloseKind, SocketEvent};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Test-side handle to one mock connection.
///
/// # Example
///
/// ```ignore
/// let connector = MockConnector::new();
/// // ... supervisor connects ...
/// let socket = connector.last_socket().unwrap();
/// socket.push_text("Hel");
/// socket.close(Some(1006));
/// ```
#[derive(Debug, Clone)]
pub struct MockSocket {
    inbound: mpsc::UnboundedSender<SocketEvent>,
    sent: Arc<Mutex<Vec<OutboundFrame>>>,
}

impl MockSocket {
    /// Deliver a text frame to the reader. Returns false once the socket has ended.
    pub fn push_text(&self, text: &str) -> bool {
        self.push(SocketEvent::Text(text.to_string()))
    }

    /// Deliver a close from the peer with the given code.
    pub fn close(&self, code: Option<u16>) -> bool {
        self.push(SocketEvent::Closed(CloseKind::from_code(code)))
    }

    /// Deliver a transport failure.
    pub fn fail(&self, message: &str) -> bool {
        self.push(SocketEvent::Error(message.to_string()))
    }

    /// End the inbound stream without a close frame.
    pub fn end(&self) {
        self.inbound.close_channel();
    }

    pub fn push(&self, event: SocketEvent) -> bool {
        self.inbound.unbounded_send(event).is_ok()
    }

    /// Everything the supervisor has written to this socket.
    pub fn sent(&self) -> Vec<OutboundFrame> {
        lock(&self.sent).clone()
    }

    /// Text frames written to this socket, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|frame| match frame {
                OutboundFrame::Text(text) => Some(text),
                OutboundFrame::Close => None,
            })
            .collect()
    }

    /// Whether the supervisor sent a close frame.
    pub fn was_closed_locally(&self) -> bool {
        self.sent().contains(&OutboundFrame::Close)
    }
}

#[derive(Debug, Default)]
struct ConnectorState {
    attempts: usize,
    refuse_remaining: usize,
    urls: Vec<String>,
    sockets: Vec<MockSocket>,
}

/// Mock connector that hands out in-memory sockets.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` connection attempts.
    pub fn refuse_next(&self, count: usize) {
        lock(&self.state).refuse_remaining = count;
    }

    /// Number of connection attempts, successful or not.
    pub fn attempts(&self) -> usize {
        lock(&self.state).attempts
    }

    /// Number of sockets successfully opened.
    pub fn connect_count(&self) -> usize {
        lock(&self.state).sockets.len()
    }

    pub fn urls(&self) -> Vec<String> {
        lock(&self.state).urls.clone()
    }

    /// The most recently opened socket.
    pub fn last_socket(&self) -> Option<MockSocket> {
        lock(&self.state).sockets.last().cloned()
    }

    pub fn socket(&self, index: usize) -> Option<MockSocket> {
        lock(&self.state).sockets.get(index).cloned()
    }
}

#[async_trait]
impl WsConnector for MockConnector {
    async fn connect(&self, url: &str) -> Result<SocketPair, TransportError> {
        let mut state = lock(&self.state);
        state.attempts += 1;
        state.urls.push(url.to_string());

        if state.refuse_remaining > 0 {
            state.refuse_remaining -= 1;
            return Err(TransportError::ConnectionFailed {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        let (inbound_tx, inbound_rx) = mpsc::unbounded();
        let sent = Arc::new(Mutex::new(Vec::new()));

        let sink = futures::sink::unfold(
            Arc::clone(&sent),
            |sent: Arc<Mutex<Vec<OutboundFrame>>>, frame: OutboundFrame| async move {
                lock(&sent).push(frame);
                Ok::<_, TransportError>(sent)
            },
        );

        state.sockets.push(MockSocket {
            inbound: inbound_tx,
            sent,
        });

        Ok(SocketPair {
            sink: Box::pin(sink),
            stream: Box::pin(inbound_rx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, StreamExt};

    #[tokio::test]
    async fn test_connect_records_socket() {
        let connector = MockConnector::new();
        let mut pair = connector.connect("ws://test/ws/chat").await.unwrap();

        assert_eq!(connector.connect_count(), 1);
        assert_eq!(connector.urls(), vec!["ws://test/ws/chat".to_string()]);

        let socket = connector.last_socket().unwrap();
        assert!(socket.push_text("hello"));
        assert_eq!(
            pair.stream.next().await,
            Some(SocketEvent::Text("hello".to_string()))
        );

        pair.sink
            .send(OutboundFrame::Text("out".to_string()))
            .await
            .unwrap();
        pair.sink.send(OutboundFrame::Close).await.unwrap();
        assert_eq!(socket.sent_texts(), vec!["out".to_string()]);
        assert!(socket.was_closed_locally());
    }

    #[tokio::test]
    async fn test_refuse_next() {
        let connector = MockConnector::new();
        connector.refuse_next(1);

        assert!(connector.connect("ws://test").await.is_err());
        assert!(connector.connect("ws://test").await.is_ok());
        assert_eq!(connector.attempts(), 2);
        assert_eq!(connector.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_end_terminates_stream() {
        let connector = MockConnector::new();
        let mut pair = connector.connect("ws://test").await.unwrap();
        let socket = connector.last_socket().unwrap();

        socket.close(Some(1000));
        socket.end();
        assert_eq!(
            pair.stream.next().await,
            Some(SocketEvent::Closed(CloseKind::Normal))
        );
        assert_eq!(pair.stream.next().await, None);
        assert!(!socket.push_text("late"));
    }
}
