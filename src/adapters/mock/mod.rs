//! Mock implementations for testing.
//!
//! These implement the trait abstractions without network access.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with configurable responses and streams
//! - [`MockConnector`] - WebSocket connector handing out injectable sockets

pub mod http;
pub mod websocket;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use websocket::{MockConnector, MockSocket};
