/// Messaging session: per-screen state reconciliation
///
/// Owns the message list and conversation summaries for one identity,
/// typically for the lifetime of one screen. Optimistic sends are NOT
/// appended locally; the socket echo is the single source of truth, and
/// the de-duplication key collapses the echo/broadcast double delivery.
use crate::api::MessageApi;
use crate::conversations::aggregate_shop_messages;
use crate::error::Result;
use crate::messaging_types::{ConnectionIdentity, ConversationSummary, Message, Role};
use crate::socket::SocketClient;
use futures_util::future::join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct MessagingSession {
    identity: ConnectionIdentity,
    api: Arc<dyn MessageApi>,
    socket: SocketClient,
    messages: Arc<Mutex<Vec<Message>>>,
    conversations: Mutex<Vec<ConversationSummary>>,
}

impl MessagingSession {
    pub fn new(
        identity: ConnectionIdentity,
        api: Arc<dyn MessageApi>,
        socket: SocketClient,
    ) -> Self {
        Self {
            identity,
            api,
            socket,
            messages: Arc::new(Mutex::new(Vec::new())),
            conversations: Mutex::new(Vec::new()),
        }
    }

    /// Install the inbound handler, then connect the transport. Inbound
    /// pushes are appended unless an equivalent message (same text, sender
    /// and creation time) is already present — the same message routinely
    /// arrives twice, once as room broadcast and once as sender echo.
    pub async fn start(&self) -> Result<()> {
        // The handler must be in place before the connection opens: the
        // server may push as soon as it sees the join announcement, and a
        // push landing on an empty handler slot is gone for good.
        let messages = self.messages.clone();
        self.socket.on_receive_message(move |incoming: Message| {
            let mut list = messages.lock();
            if list.iter().any(|m| m.is_duplicate_of(&incoming)) {
                debug!("Duplicate message from {}, ignoring", incoming.sender_id);
                return;
            }
            list.push(incoming);
        });

        self.socket
            .connect(&self.identity.user_id, self.identity.role)
            .await?;

        Ok(())
    }

    /// Remove the inbound handler (screen teardown). The connection itself
    /// stays up for whatever session attaches next.
    pub fn close(&self) {
        self.socket.off_receive_message();
    }

    /// Emit over the socket for latency, persist over REST for durability.
    /// Local state is untouched here; the message lands via the echo path.
    /// A REST failure propagates so the UI can offer a retry; the socket
    /// emit is not rolled back.
    pub async fn send_message(&self, message: Message) -> Result<()> {
        self.socket.send_message(&message).await;
        self.api.create_message(&message).await?;
        Ok(())
    }

    /// Replace the message list with the full history of one conversation
    /// and, for admin identities, join the matching room. Concurrent calls
    /// are not fenced: the most recent response wins.
    pub async fn load_conversation(
        &self,
        customer_id: &str,
        admin_id: &str,
        shop_id: &str,
    ) -> Result<()> {
        let history = self
            .api
            .conversation_history(customer_id, admin_id, shop_id)
            .await?;
        info!(
            "Loaded {} messages for conversation customer {} / shop {}",
            history.len(),
            customer_id,
            shop_id
        );
        *self.messages.lock() = history;

        if self.identity.role == Role::Admin {
            self.socket
                .join_conversation(shop_id, admin_id, Role::Admin, customer_id, Role::Customer)
                .await;
        }

        Ok(())
    }

    /// Rebuild the per-customer summary list for a shop. Name lookups run
    /// concurrently and are best-effort: a failed lookup keeps the
    /// synthetic "Customer {id}" label. A failed history fetch degrades to
    /// an empty list rather than an error.
    pub async fn load_customer_conversations(&self, admin_id: &str, shop_id: &str) {
        let messages = match self.api.shop_messages(shop_id).await {
            Ok(messages) => messages,
            Err(e) => {
                error!("Failed to load messages for shop {}: {}", shop_id, e);
                self.conversations.lock().clear();
                return;
            }
        };

        let mut summaries = aggregate_shop_messages(&messages, shop_id);

        let lookups = summaries.iter().map(|summary| {
            let api = self.api.clone();
            let customer_id = summary.customer_id.clone();
            async move {
                let profile = api.customer_profile(&customer_id).await;
                (customer_id, profile)
            }
        });

        let mut names = HashMap::new();
        for (customer_id, result) in join_all(lookups).await {
            match result {
                Ok(profile) => {
                    if let Some(name) = profile.display_name() {
                        names.insert(customer_id, name);
                    }
                }
                Err(e) => debug!("Could not fetch customer {}: {}", customer_id, e),
            }
        }
        for summary in &mut summaries {
            if let Some(name) = names.get(&summary.customer_id) {
                summary.customer_name = name.clone();
            }
        }

        info!(
            "Loaded {} conversations for shop {} (admin {})",
            summaries.len(),
            shop_id,
            admin_id
        );
        *self.conversations.lock() = summaries;
    }

    /// Empty the message list (leaving a conversation screen)
    pub fn clear_messages(&self) {
        self.messages.lock().clear();
    }

    /// Mirror of the join performed by `load_conversation`; only
    /// meaningful for the admin role
    pub async fn leave_conversation(&self, customer_id: &str, admin_id: &str, shop_id: &str) {
        if self.identity.role == Role::Admin {
            self.socket
                .leave_conversation(shop_id, admin_id, Role::Admin, customer_id, Role::Customer)
                .await;
        }
    }

    /// Snapshot of the current message list, in display order
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    /// Snapshot of the current conversation summaries, newest first
    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.conversations.lock().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_connected()
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        &self.identity
    }
}
