//! Chat websocket: the connection supervisor and the wire types it speaks.
//!
//! The supervisor owns the only socket handle, reconnects after involuntary
//! closes, and hands decoded frames to the controller over a channel.

pub mod client;
pub mod messages;

pub use client::{ChannelSupervisor, ChatFrame, ConnectionState};
pub use messages::{ChatControl, ChatRequest, CloseKind, SocketEvent, NORMAL_CLOSE_CODE};
