//! Message history: a fixed-capacity ring with best-effort durable persistence.
//!
//! `HistoryStore` is the only writer of the persisted history. It is owned by
//! the room coordinator and never shared across tasks.

pub mod persister;
pub mod ring;

use std::{num::NonZeroUsize, sync::Arc};

use ringchat_shared::Message;

use crate::storage::HistoryStorage;

pub use persister::Persister;
pub use ring::MessageRing;

/// Default number of messages kept for replay.
pub const DEFAULT_HISTORY_CAPACITY: NonZeroUsize = NonZeroUsize::new(5).unwrap();

/// Ring buffer plus its background writer.
pub struct HistoryStore {
    ring: MessageRing,
    persister: Persister,
}

impl HistoryStore {
    /// Load the persisted history, or start empty and create the durable record.
    ///
    /// A failed load is logged and the store starts empty; the next append
    /// overwrites the unreadable record.
    pub async fn load_or_init(
        storage: Arc<dyn HistoryStorage>,
        capacity: NonZeroUsize,
    ) -> Self {
        let ring = match storage.load().await {
            Ok(Some(state)) => {
                let ring = MessageRing::restore(state, capacity);
                tracing::info!("Loaded {} messages from history storage", ring.len());
                ring
            }
            Ok(None) => {
                let ring = MessageRing::new(capacity);
                match storage.save(&ring.to_persisted()).await {
                    Ok(()) => tracing::info!("Initialized empty history storage"),
                    Err(e) => tracing::warn!("Failed to initialize history storage: {}", e),
                }
                ring
            }
            Err(e) => {
                tracing::error!("Failed to load history, starting empty: {}", e);
                MessageRing::new(capacity)
            }
        };

        Self {
            ring,
            persister: Persister::spawn(storage),
        }
    }

    /// Append `message` and schedule a durable write of the new state.
    ///
    /// Returns as soon as the in-memory ring is updated.
    pub fn append(&mut self, message: Message) {
        self.ring.push(message);
        self.persister.schedule(self.ring.to_persisted());
    }

    /// Valid messages, oldest first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.ring.snapshot()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Flush outstanding writes and stop the writer task.
    pub async fn close(self) {
        self.persister.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::StorageError,
        storage::{InMemoryHistoryStorage, MockHistoryStorage, PersistedHistory},
    };
    use chrono::{TimeZone, Utc};

    fn message(text: &str) -> Message {
        Message::chat(text, "u0001", Utc.with_ymd_and_hms(2020, 1, 1, 1, 1, 1).unwrap())
    }

    fn texts(messages: Vec<Message>) -> Vec<String> {
        messages.into_iter().map(|m| m.text).collect()
    }

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - LoadOrInit: 永続化状態の有無・読み込み失敗時の初期化
    // - Append: リングへの追加と永続化のスケジュール
    // - 再起動後に同じ Snapshot が復元されること
    // ========================================

    #[tokio::test]
    async fn test_load_or_init_without_state_creates_empty_record() {
        // テスト項目: 永続化状態がない場合は空で初期化し、空のレコードを作成する
        // given (前提条件):
        let storage = InMemoryHistoryStorage::new();

        // when (操作):
        let store = HistoryStore::load_or_init(
            Arc::new(storage.clone()),
            DEFAULT_HISTORY_CAPACITY,
        )
        .await;

        // then (期待する結果):
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 5);
        let saved = storage.saved().await.unwrap();
        assert_eq!((saved.head, saved.idx, saved.slots.len()), (0, 0, 5));
        assert_eq!(saved.populated(), 0);
        store.close().await;
    }

    #[tokio::test]
    async fn test_load_or_init_read_failure_starts_empty() {
        // テスト項目: 読み込みに失敗した場合は空の履歴で起動する
        // given (前提条件):
        let mut storage = MockHistoryStorage::new();
        storage.expect_load().returning(|| {
            Err(StorageError::Io(std::io::Error::other("permission denied")))
        });
        storage.expect_save().returning(|_| Ok(()));

        // when (操作):
        let store =
            HistoryStore::load_or_init(Arc::new(storage), DEFAULT_HISTORY_CAPACITY).await;

        // then (期待する結果):
        assert!(store.is_empty());
        store.close().await;
    }

    #[tokio::test]
    async fn test_append_schedules_persistence() {
        // テスト項目: Append した内容が close 後にストレージへ反映されている
        // given (前提条件):
        let storage = InMemoryHistoryStorage::new();
        let mut store = HistoryStore::load_or_init(
            Arc::new(storage.clone()),
            DEFAULT_HISTORY_CAPACITY,
        )
        .await;

        // when (操作):
        store.append(message("m1"));
        store.append(message("m2"));
        store.close().await;

        // then (期待する結果):
        let saved = storage.saved().await.unwrap();
        assert_eq!(texts(saved.ordered_messages()), ["m1", "m2"]);
        assert_eq!((saved.head, saved.idx), (0, 2));
    }

    #[tokio::test]
    async fn test_restart_reconstructs_identical_snapshot() {
        // テスト項目: 再起動（再読み込み）後の Snapshot が終了前と同一になる
        // given (前提条件): 容量 5 に 7 件追加して終了
        let storage = InMemoryHistoryStorage::new();
        let mut store = HistoryStore::load_or_init(
            Arc::new(storage.clone()),
            DEFAULT_HISTORY_CAPACITY,
        )
        .await;
        for t in ["m1", "m2", "m3", "m4", "m5", "m6", "m7"] {
            store.append(message(t));
        }
        let before = store.snapshot();
        store.close().await;

        // when (操作):
        let reloaded = HistoryStore::load_or_init(
            Arc::new(storage.clone()),
            DEFAULT_HISTORY_CAPACITY,
        )
        .await;

        // then (期待する結果):
        assert_eq!(reloaded.snapshot(), before);
        assert_eq!(texts(before), ["m3", "m4", "m5", "m6", "m7"]);
        reloaded.close().await;
    }

    #[tokio::test]
    async fn test_load_or_init_restores_wrapped_ring() {
        // テスト項目: head が途中にある永続化状態から挿入順どおりに復元される
        // given (前提条件):
        let state = PersistedHistory {
            head: 3,
            idx: 3,
            slots: ["d", "e", "f", "a", "b"]
                .into_iter()
                .map(|t| Some(message(t)))
                .collect(),
        };
        let storage = InMemoryHistoryStorage::with_state(state);

        // when (操作):
        let store =
            HistoryStore::load_or_init(Arc::new(storage), DEFAULT_HISTORY_CAPACITY).await;

        // then (期待する結果):
        assert_eq!(texts(store.snapshot()), ["a", "b", "d", "e", "f"]);
        assert_eq!(store.len(), 5);
        store.close().await;
    }
}
