//! Background history writer.
//!
//! Appends must never wait on the disk, so every state change is handed to a
//! detached task through a latest-value channel. Scheduling only replaces the
//! slot; the task wakes on each change and writes the newest image, so states
//! scheduled while a save is in flight collapse into one follow-up write.
//!
//! A message can therefore reach live clients before it is durable, and a crash
//! may lose the last few appends.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};

use crate::storage::{HistoryStorage, PersistedHistory};

/// Handle to the detached history writer task.
pub struct Persister {
    tx: watch::Sender<Option<PersistedHistory>>,
    task: JoinHandle<()>,
}

impl Persister {
    /// Spawn the writer task.
    pub fn spawn(storage: Arc<dyn HistoryStorage>) -> Self {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(writer_loop(storage, rx));
        Self { tx, task }
    }

    /// Hand `state` to the writer without waiting. Replaces any state not yet written.
    pub fn schedule(&self, state: PersistedHistory) {
        if self.tx.is_closed() {
            tracing::error!("History writer has stopped, state change will not be persisted");
            return;
        }
        self.tx.send_replace(Some(state));
    }

    /// Write the last scheduled state, if still unwritten, and wait for the writer to stop.
    pub async fn close(self) {
        let Self { tx, task } = self;
        // the writer still observes a value sent before the sender is dropped
        drop(tx);

        if let Err(e) = task.await {
            tracing::error!("History writer task failed: {}", e);
        }
    }
}

async fn writer_loop(
    storage: Arc<dyn HistoryStorage>,
    mut rx: watch::Receiver<Option<PersistedHistory>>,
) {
    while rx.changed().await.is_ok() {
        // 書き込み中に届いた古い状態は上書きされ、最新のものだけが残る
        let Some(state) = rx.borrow_and_update().clone() else {
            continue;
        };

        if let Err(e) = storage.save(&state).await {
            tracing::warn!("Failed to persist history: {}", e);
        }
    }
    tracing::debug!("History writer stopped");
}
