/// Socket event envelope shared with the realtime server
///
/// Frames are JSON text of the form `{"event": "...", "data": ...}`.
/// The event names are part of the server contract and must not drift.
use crate::messaging_types::{Message, Role};
use serde::{Deserialize, Serialize};

/// Events the client emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Bind this connection to a user identity so the server can route
    /// pushes to it
    #[serde(rename = "join")]
    Join {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "userType")]
        user_type: Role,
    },

    /// Low-latency delivery of a freshly written message
    #[serde(rename = "sendMessage")]
    SendMessage(Message),

    /// Enter a conversation room; the payload is the room key
    #[serde(rename = "joinConversation")]
    JoinConversation(String),

    /// Leave a conversation room
    #[serde(rename = "leaveConversation")]
    LeaveConversation(String),
}

/// Events the server pushes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A message routed to this identity or one of its rooms
    #[serde(rename = "receiveMessage")]
    ReceiveMessage(Message),
}

impl ClientEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Event name as it appears on the wire
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientEvent::Join { .. } => "join",
            ClientEvent::SendMessage(_) => "sendMessage",
            ClientEvent::JoinConversation(_) => "joinConversation",
            ClientEvent::LeaveConversation(_) => "leaveConversation",
        }
    }
}

impl ServerEvent {
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}
