//! Room coordinator: the single serialization point of the chat room.
//!
//! ## 概要
//!
//! 接続ごとのセッションは `RoomHandle` を通してイベント（join / leave / deliver）を
//! キューに積むだけで、`ConnectionRegistry` と `HistoryStore` には一切触れません。
//! コーディネーターは 1 つのタスクでイベントを 1 件ずつ処理するため、
//! 全クライアントが同じ順序でメッセージを観測します。
//!
//! ## 処理
//!
//! - `join`: 名前の割り当て → 登録 → `ENTRY_OK` → 履歴のリプレイ
//! - `leave`: `EXIT_OK` → 登録解除
//! - `deliver`: 履歴へ追加 → 全接続へブロードキャスト

mod deliver;
mod join;
mod leave;
pub mod registry;

use std::sync::Arc;

use ringchat_shared::{Message, time::Clock};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    domain::{ConnectionId, DisplayName, NameAllocator, RoomError},
    history::HistoryStore,
};

pub use registry::{ConnectionRegistry, PusherChannel};

/// Events consumed by the coordinator, in arrival order.
#[derive(Debug)]
pub enum RoomEvent {
    /// A connection was accepted and wants to enter the room
    Join {
        connection_id: ConnectionId,
        sender: PusherChannel,
    },
    /// A connection ended (read failure, close or `/exit`)
    Leave { connection_id: ConnectionId },
    /// A connection sent a chat message
    Deliver {
        connection_id: ConnectionId,
        message: Message,
    },
    /// Current history, oldest first
    History { reply: oneshot::Sender<Vec<Message>> },
    /// Display names of the registered connections, sorted
    Participants {
        reply: oneshot::Sender<Vec<DisplayName>>,
    },
    /// Stop the loop and flush the history
    Shutdown { reply: oneshot::Sender<()> },
}

/// Cloneable handle used by sessions and HTTP handlers to talk to the coordinator.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    events: mpsc::UnboundedSender<RoomEvent>,
}

impl RoomHandle {
    pub fn join(&self, connection_id: ConnectionId, sender: PusherChannel) -> Result<(), RoomError> {
        self.send(RoomEvent::Join {
            connection_id,
            sender,
        })
    }

    pub fn leave(&self, connection_id: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomEvent::Leave { connection_id })
    }

    pub fn deliver(&self, connection_id: ConnectionId, message: Message) -> Result<(), RoomError> {
        self.send(RoomEvent::Deliver {
            connection_id,
            message,
        })
    }

    /// Current history, oldest first
    pub async fn history(&self) -> Result<Vec<Message>, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomEvent::History { reply })?;
        rx.await.map_err(|_| RoomError::CoordinatorStopped)
    }

    /// Display names of the registered connections, sorted
    pub async fn participants(&self) -> Result<Vec<DisplayName>, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomEvent::Participants { reply })?;
        rx.await.map_err(|_| RoomError::CoordinatorStopped)
    }

    /// Ask the coordinator to stop and wait until the history has been flushed.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomEvent::Shutdown { reply })?;
        rx.await.map_err(|_| RoomError::CoordinatorStopped)
    }

    fn send(&self, event: RoomEvent) -> Result<(), RoomError> {
        self.events
            .send(event)
            .map_err(|_| RoomError::CoordinatorStopped)
    }
}

/// Owner of the room state. Runs as one task; see [`RoomCoordinator::spawn`].
pub struct RoomCoordinator {
    registry: ConnectionRegistry,
    history: HistoryStore,
    allocator: NameAllocator,
    clock: Arc<dyn Clock>,
}

impl RoomCoordinator {
    pub fn new(history: HistoryStore, allocator: NameAllocator, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            history,
            allocator,
            clock,
        }
    }

    /// Start the event loop on its own task.
    pub fn spawn(self) -> (RoomHandle, JoinHandle<()>) {
        let (events, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        (RoomHandle { events }, task)
    }

    /// Process events one at a time until `Shutdown` arrives or every handle is dropped.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<RoomEvent>) {
        tracing::info!(
            "Room coordinator started with {} messages of history",
            self.history.len()
        );

        let mut shutdown_reply = None;
        while let Some(event) = events.recv().await {
            if let RoomEvent::Shutdown { reply } = event {
                shutdown_reply = Some(reply);
                break;
            }
            self.handle_event(event);
        }

        tracing::info!(
            "Room coordinator stopping ({} connections still registered)",
            self.registry.len()
        );
        self.history.close().await;
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    fn handle_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Join {
                connection_id,
                sender,
            } => self.join(connection_id, sender),
            RoomEvent::Leave { connection_id } => self.leave(connection_id),
            RoomEvent::Deliver {
                connection_id,
                message,
            } => self.deliver(connection_id, message),
            RoomEvent::History { reply } => {
                let _ = reply.send(self.history.snapshot());
            }
            RoomEvent::Participants { reply } => {
                let mut names: Vec<_> = self.registry.names().into_iter().collect();
                names.sort();
                let _ = reply.send(names);
            }
            RoomEvent::Shutdown { reply } => {
                // run() intercepts shutdown before dispatching
                let _ = reply.send(());
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::num::NonZeroUsize;

    use chrono::{DateTime, TimeZone, Utc};
    use ringchat_shared::time::FixedClock;

    use super::*;
    use crate::storage::InMemoryHistoryStorage;

    pub fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    pub async fn coordinator_with_capacity(capacity: usize) -> RoomCoordinator {
        let history = HistoryStore::load_or_init(
            Arc::new(InMemoryHistoryStorage::new()),
            NonZeroUsize::new(capacity).unwrap(),
        )
        .await;
        RoomCoordinator::new(
            history,
            NameAllocator::with_seed(7),
            Arc::new(FixedClock::new(fixed_time())),
        )
    }

    /// Join a fresh connection and drain its ENTRY_OK + replay
    pub fn join_client(
        coordinator: &mut RoomCoordinator,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<Message>, Vec<Message>) {
        let connection_id = ConnectionId::generate();
        let (tx, mut rx) = mpsc::unbounded_channel();
        coordinator.join(connection_id, tx);
        let received = drain(&mut rx);
        (connection_id, rx, received)
    }

    pub fn drain(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<Message> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    pub fn chat(text: &str, minute: u32) -> Message {
        Message::chat(
            text,
            "",
            Utc.with_ymd_and_hms(2020, 1, 1, 1, minute, 0).unwrap(),
        )
    }
}
