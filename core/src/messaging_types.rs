/// Shared types for the messaging layer
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a conversation a participant is on.
/// The wire uses the lowercase tokens "customer" and "admin".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One chat message between a customer and a shop admin.
///
/// `id` and `created_at` are server-assigned and absent on optimistic
/// local copies; they are skipped on serialization so the same struct
/// doubles as the `POST /messages` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub sender_type: Role,
    pub sender_id: String,
    pub receiver_type: Role,
    pub receiver_id: String,
    pub shop_id: String,
    pub message_text: String,
    /// RFC3339 creation timestamp, set by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Message {
    /// De-duplication key: the same text from the same sender at the same
    /// creation time is the same logical message, whichever path delivered it
    pub fn dedup_key(&self) -> (&str, &str, Option<&str>) {
        (
            self.message_text.as_str(),
            self.sender_id.as_str(),
            self.created_at.as_deref(),
        )
    }

    pub fn is_duplicate_of(&self, other: &Message) -> bool {
        self.dedup_key() == other.dedup_key()
    }

    /// Parsed creation time; missing or unparseable timestamps fall back
    /// to the Unix epoch so they sort before everything real
    pub fn created_at_time(&self) -> DateTime<Utc> {
        parse_created_at(self.created_at.as_deref())
    }
}

/// Parse an optional RFC3339 timestamp, defaulting to the epoch
pub fn parse_created_at(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Summary of one customer thread as seen by a shop admin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub customer_id: String,
    pub customer_name: String,
    pub shop_id: String,
    #[serde(rename = "lastMessage")]
    pub last_message: String,
    #[serde(rename = "lastMessageTime", skip_serializing_if = "Option::is_none")]
    pub last_message_time: Option<String>,
    pub unread: bool,
}

/// The (user, role) pair bound to one transport connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIdentity {
    pub user_id: String,
    pub role: Role,
}

/// Customer record returned by the profile endpoint; only used for
/// display-name resolution in the conversation list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerProfile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl CustomerProfile {
    /// "First Last", trimmed; None when the record carries no usable name
    pub fn display_name(&self) -> Option<String> {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();

        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

/// Deterministic conversation-room key. Both ends must derive it with the
/// same concatenation order (sender first) for the server to pair them.
pub fn conversation_room_id(
    shop_id: &str,
    sender_type: Role,
    sender_id: &str,
    receiver_type: Role,
    receiver_id: &str,
) -> String {
    format!(
        "shop_{}_{}_{}_{}_{}",
        shop_id, sender_type, sender_id, receiver_type, receiver_id
    )
}
