/// Websocket transport client
///
/// One persistent connection per logged-in identity. Pure plumbing: no
/// conversation state lives here. The client is cheap to clone and meant
/// to be injected into each session rather than reached for as a global,
/// so tests never leak connection state across cases.
use crate::config::Config;
use crate::error::{ChatError, Result};
use crate::messaging_types::{conversation_room_id, ConnectionIdentity, Message, Role};
use crate::socket::protocol::{ClientEvent, ServerEvent};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

/// Connection state of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type ReceiveCallback = Arc<dyn Fn(Message) + Send + Sync>;

/// Shared websocket client
pub struct SocketClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    state: RwLock<ConnectionState>,
    identity: RwLock<Option<ConnectionIdentity>>,
    writer: tokio::sync::Mutex<Option<WsSink>>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
    /// Bumped on every connect. The reader loop carries the value it was
    /// spawned with, so a reader outliving its connection cannot touch the
    /// state of a newer one.
    generation: AtomicU64,
    /// Single optional handler slot. Registering replaces, never stacks:
    /// exactly one listener consumes inbound messages at a time.
    on_receive: RwLock<Option<ReceiveCallback>>,
}

impl SocketClient {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: RwLock::new(ConnectionState::Disconnected),
                identity: RwLock::new(None),
                writer: tokio::sync::Mutex::new(None),
                reader_task: Mutex::new(None),
                generation: AtomicU64::new(0),
                on_receive: RwLock::new(None),
            }),
        }
    }

    /// Open the connection and bind it to (user_id, role). Once open, a
    /// `join` event announces the identity so the server can route pushes
    /// here. No-op when already connected or connecting; the identity in
    /// place stays bound. No automatic retry on failure.
    pub async fn connect(&self, user_id: &str, role: Role) -> Result<()> {
        {
            let mut state = self.inner.state.write();
            if *state != ConnectionState::Disconnected {
                debug!("connect: transport already {:?}, ignoring", *state);
                return Ok(());
            }
            *state = ConnectionState::Connecting;
        }

        // A lost connection can leave its reader and writer behind; clear
        // them so nothing from the dead link outlives this attempt.
        if let Some(task) = self.inner.reader_task.lock().take() {
            task.abort();
        }
        *self.inner.writer.lock().await = None;
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let url = self.inner.config.socket_url.clone();
        let ws = match timeout(self.inner.config.connect_timeout, connect_async(url.as_str())).await
        {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => {
                *self.inner.state.write() = ConnectionState::Disconnected;
                error!("Connection error: {}", e);
                return Err(ChatError::Connection(e.to_string()));
            }
            Err(_) => {
                *self.inner.state.write() = ConnectionState::Disconnected;
                error!("Connection timeout to {}", url);
                return Err(ChatError::Connection(format!("timeout connecting to {}", url)));
            }
        };

        let (mut sink, mut stream) = ws.split();

        let join = ClientEvent::Join {
            user_id: user_id.to_string(),
            user_type: role,
        };
        let frame = join.to_json()?;
        if let Err(e) = sink.send(WsMessage::Text(frame.into())).await {
            *self.inner.state.write() = ConnectionState::Disconnected;
            error!("Failed to emit join: {}", e);
            return Err(ChatError::Connection(e.to_string()));
        }

        *self.inner.writer.lock().await = Some(sink);
        *self.inner.identity.write() = Some(ConnectionIdentity {
            user_id: user_id.to_string(),
            role,
        });
        *self.inner.state.write() = ConnectionState::Connected;
        info!("Connected to {} as {} ({})", url, user_id, role);

        // Reader loop. The handler slot is read on every dispatch so a
        // listener installed after connect still sees later pushes.
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(WsMessage::Text(text)) => match ServerEvent::from_json(&text) {
                        Ok(ServerEvent::ReceiveMessage(message)) => {
                            debug!("Received message from {}", message.sender_id);
                            let callback = inner.on_receive.read().clone();
                            match callback {
                                Some(cb) => cb(message),
                                None => debug!("No receive handler installed, dropping push"),
                            }
                        }
                        Err(e) => debug!("Ignoring unrecognized socket frame: {}", e),
                    },
                    Ok(WsMessage::Close(_)) => {
                        info!("Server closed the connection");
                        break;
                    }
                    Ok(_) => {
                        // ping/pong are answered by tungstenite itself
                    }
                    Err(e) => {
                        error!("Socket read error: {}", e);
                        break;
                    }
                }
            }
            // Only the reader of the current connection may settle the
            // state; a stale reader winding down after a reconnect must
            // not flip its replacement back to Disconnected.
            if inner.generation.load(Ordering::SeqCst) == generation {
                *inner.state.write() = ConnectionState::Disconnected;
            }
        });
        *self.inner.reader_task.lock() = Some(task);

        Ok(())
    }

    /// Tear down the connection. Safe to call when already disconnected.
    pub async fn disconnect(&self) {
        if let Some(task) = self.inner.reader_task.lock().take() {
            task.abort();
        }
        if let Some(mut sink) = self.inner.writer.lock().await.take() {
            let _ = sink.close().await;
        }
        *self.inner.identity.write() = None;

        let was_connected = {
            let mut state = self.inner.state.write();
            let was = *state != ConnectionState::Disconnected;
            *state = ConnectionState::Disconnected;
            was
        };
        if was_connected {
            info!("Disconnected from {}", self.inner.config.socket_url);
        }
    }

    /// Fire-and-forget delivery of a message to the counterpart's session.
    /// Drops silently when the connection is down; durability is the REST
    /// call's job, not the transport's.
    pub async fn send_message(&self, message: &Message) {
        self.emit(ClientEvent::SendMessage(message.clone())).await;
    }

    /// Register the inbound-message handler. A second registration
    /// replaces the first.
    pub fn on_receive_message<F>(&self, callback: F)
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        *self.inner.on_receive.write() = Some(Arc::new(callback));
    }

    /// Remove the inbound-message handler
    pub fn off_receive_message(&self) {
        *self.inner.on_receive.write() = None;
    }

    pub async fn join_conversation(
        &self,
        shop_id: &str,
        sender_id: &str,
        sender_type: Role,
        receiver_id: &str,
        receiver_type: Role,
    ) {
        let room = conversation_room_id(shop_id, sender_type, sender_id, receiver_type, receiver_id);
        debug!("Joining conversation room {}", room);
        self.emit(ClientEvent::JoinConversation(room)).await;
    }

    pub async fn leave_conversation(
        &self,
        shop_id: &str,
        sender_id: &str,
        sender_type: Role,
        receiver_id: &str,
        receiver_type: Role,
    ) {
        let room = conversation_room_id(shop_id, sender_type, sender_id, receiver_type, receiver_id);
        debug!("Leaving conversation room {}", room);
        self.emit(ClientEvent::LeaveConversation(room)).await;
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.state.read() == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    /// Identity currently bound to the connection, if any
    pub fn identity(&self) -> Option<ConnectionIdentity> {
        self.inner.identity.read().clone()
    }

    async fn emit(&self, event: ClientEvent) {
        if !self.is_connected() {
            debug!("Dropping '{}' emit: not connected", event.event_name());
            return;
        }
        let frame = match event.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode '{}' event: {}", event.event_name(), e);
                return;
            }
        };

        let mut writer = self.inner.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            debug!("Dropping '{}' emit: no writer", event.event_name());
            return;
        };
        if let Err(e) = sink.send(WsMessage::Text(frame.into())).await {
            warn!("Socket write failed, tearing the connection down: {}", e);
            *writer = None;
            if let Some(task) = self.inner.reader_task.lock().take() {
                task.abort();
            }
            *self.inner.state.write() = ConnectionState::Disconnected;
        }
    }
}

impl Clone for SocketClient {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
