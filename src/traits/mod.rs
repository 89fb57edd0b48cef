//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP operations (GET, streaming multipart POST)
//! - [`WsConnector`] - opening chat websocket connections

pub mod http;
pub mod websocket;

pub use http::{ByteStream, HttpClient, MultipartForm, Response};
pub use websocket::{OutboundFrame, SocketPair, SocketSink, SocketStream, WsConnector};
