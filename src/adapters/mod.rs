//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`TungsteniteConnector`] - WebSocket connector using tokio-tungstenite
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for both:
//! - [`mock::MockHttpClient`] - Configurable HTTP responses and body streams
//! - [`mock::MockConnector`] - Sockets with event injection

pub mod mock;
pub mod reqwest_http;
pub mod tungstenite_ws;

pub use mock::{MockConnector, MockHttpClient};
pub use reqwest_http::ReqwestHttpClient;
pub use tungstenite_ws::TungsteniteConnector;
