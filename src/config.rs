//! Client configuration.
//!
//! Defaults point at a backend on localhost; `from_env` lets a deployment
//! move both transports without recompiling.

use std::time::Duration;

use tracing::warn;

/// Default base URL for the HTTP endpoints (upload, sessions, history).
pub const DEFAULT_HTTP_BASE_URL: &str = "http://localhost:8000";

/// Default URL of the persistent chat channel.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws/chat";

/// Inactivity after which a streamed chat response is considered finished.
pub const DEFAULT_QUIESCENCE_WINDOW: Duration = Duration::from_millis(1000);

/// Delay before each reconnection attempt after an involuntary close.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// How long a send waits for a cold channel to open before failing.
pub const DEFAULT_SEND_GRACE_PERIOD: Duration = Duration::from_millis(2000);

/// Configuration for the chat client.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use lexchat::config::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_http_base_url("http://10.0.0.5:8000")
///     .with_quiescence_window(Duration::from_millis(500));
/// assert_eq!(config.upload_url(), "http://10.0.0.5:8000/upload");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL for HTTP endpoints, without a trailing slash
    pub http_base_url: String,
    /// Full URL of the chat websocket
    pub ws_url: String,
    /// Quiescence window for chat turn completion
    pub quiescence_window: Duration,
    /// Fixed delay between reconnection attempts
    pub reconnect_delay: Duration,
    /// Grace period a send waits for the channel to reach `open`
    pub send_grace_period: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            http_base_url: DEFAULT_HTTP_BASE_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            quiescence_window: DEFAULT_QUIESCENCE_WINDOW,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            send_grace_period: DEFAULT_SEND_GRACE_PERIOD,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_base_url(mut self, url: impl Into<String>) -> Self {
        self.http_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    pub fn with_quiescence_window(mut self, window: Duration) -> Self {
        self.quiescence_window = window;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_send_grace_period(mut self, grace: Duration) -> Self {
        self.send_grace_period = grace;
        self
    }

    /// Build a config from defaults overridden by environment variables.
    ///
    /// - `LEXCHAT_HTTP_URL` - HTTP base URL
    /// - `LEXCHAT_WS_URL` - chat websocket URL
    /// - `LEXCHAT_QUIESCENCE_MS` - quiescence window in milliseconds
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("LEXCHAT_HTTP_URL") {
            config = config.with_http_base_url(url);
        }
        if let Ok(url) = std::env::var("LEXCHAT_WS_URL") {
            config = config.with_ws_url(url);
        }
        if let Ok(raw) = std::env::var("LEXCHAT_QUIESCENCE_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => config = config.with_quiescence_window(Duration::from_millis(ms)),
                Err(e) => warn!("Ignoring LEXCHAT_QUIESCENCE_MS={:?}: {}", raw, e),
            }
        }

        config
    }

    pub fn upload_url(&self) -> String {
        format!("{}/upload", self.http_base_url)
    }

    pub fn sessions_url(&self) -> String {
        format!("{}/sessions", self.http_base_url)
    }

    /// History endpoint; the id is a path segment and is percent-encoded.
    pub fn history_url(&self, session_id: &str) -> String {
        format!(
            "{}/chat/{}",
            self.http_base_url,
            urlencoding::encode(session_id)
        )
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.http_base_url)
    }
}
