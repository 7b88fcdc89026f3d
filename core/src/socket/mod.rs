/// Realtime transport: event envelope + websocket client
pub mod client;
pub mod protocol;

pub use client::{ConnectionState, SocketClient};
pub use protocol::{ClientEvent, ServerEvent};
