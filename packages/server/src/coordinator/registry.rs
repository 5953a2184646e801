//! Live connections of the room.
//!
//! ## 責務
//!
//! - 接続 ID → (送信チャネル, 表示名) の管理
//! - 特定の接続への送信 (`push_to`) と全接続への送信 (`broadcast`)
//!
//! ## 設計ノート
//!
//! WebSocket の生成はセッション（`ui/handler/websocket.rs`）で行われ、ここには
//! そのセッションの送信キューにつながる `PusherChannel` だけが渡されます。
//! レジストリはコーディネーターだけが所有・変更するため、ロックは不要です。

use std::collections::{HashMap, HashSet};

use ringchat_shared::Message;
use tokio::sync::mpsc;

use crate::domain::{ConnectionId, DisplayName, PushError};

/// Outbound queue of one connection. The session drains it into its socket.
pub type PusherChannel = mpsc::UnboundedSender<Message>;

/// Registered connection
#[derive(Debug)]
pub struct ClientHandle {
    /// Display name assigned on join
    pub name: DisplayName,
    sender: PusherChannel,
}

/// Mapping of connection identity to its outbound channel and display name.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: HashMap<ConnectionId, ClientHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Returns the handle it replaced, if the identity was already present.
    pub fn insert(
        &mut self,
        connection_id: ConnectionId,
        name: DisplayName,
        sender: PusherChannel,
    ) -> Option<ClientHandle> {
        tracing::debug!("Connection '{}' registered as '{}'", connection_id, name);
        self.clients
            .insert(connection_id, ClientHandle { name, sender })
    }

    /// Deregister a connection. Dropping the returned handle closes its outbound channel.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<ClientHandle> {
        let removed = self.clients.remove(connection_id);
        if removed.is_some() {
            tracing::debug!("Connection '{}' unregistered", connection_id);
        }
        removed
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.clients.contains_key(connection_id)
    }

    /// Display name registered for `connection_id`
    pub fn name_of(&self, connection_id: &ConnectionId) -> Option<&DisplayName> {
        self.clients.get(connection_id).map(|client| &client.name)
    }

    /// Names of every registered connection
    pub fn names(&self) -> HashSet<DisplayName> {
        self.clients
            .values()
            .map(|client| client.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Send `message` to a single connection.
    pub fn push_to(&self, connection_id: &ConnectionId, message: Message) -> Result<(), PushError> {
        let client = self
            .clients
            .get(connection_id)
            .ok_or(PushError::ClientNotFound(*connection_id))?;
        client
            .sender
            .send(message)
            .map_err(|_| PushError::ChannelClosed(*connection_id))
    }

    /// Send `message` to every registered connection.
    ///
    /// A failed send is logged and skipped; it neither aborts the fan-out nor
    /// removes the connection. Returns the number of successful sends.
    pub fn broadcast(&self, message: &Message) -> usize {
        let mut delivered = 0;
        for (connection_id, client) in &self.clients {
            // ブロードキャストでは一部の送信失敗を許容
            if let Err(e) = client.sender.send(message.clone()) {
                tracing::warn!(
                    "Failed to push message to '{}' ({}): {}",
                    client.name,
                    connection_id,
                    e
                );
            } else {
                delivered += 1;
            }
        }
        delivered
    }
}
