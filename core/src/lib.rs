/// LaundryLink Messaging Core
///
/// Client-side real-time messaging layer for the laundry-shop backend:
/// a websocket transport, a per-screen messaging session with
/// de-duplication and history reconciliation, and a pure conversation
/// aggregator for the admin's thread list.

pub mod error;
pub mod config;
pub mod messaging_types;
pub mod conversations;
pub mod api;
pub mod session;
pub mod socket;

pub use error::{ChatError, Result};
pub use config::Config;
pub use messaging_types::{ConnectionIdentity, ConversationSummary, CustomerProfile, Message, Role};
pub use session::MessagingSession;
pub use socket::client::{ConnectionState, SocketClient};
