//! InMemory HistoryStorage 実装
//!
//! プロセス終了とともに履歴は失われます。テストと `--no-persist` 起動で使用します。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::StorageError;

use super::{HistoryStorage, PersistedHistory};

/// History kept in process memory.
///
/// Clones share the same underlying record.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoryStorage {
    state: Arc<Mutex<Option<PersistedHistory>>>,
}

impl InMemoryHistoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `state`.
    pub fn with_state(state: PersistedHistory) -> Self {
        Self {
            state: Arc::new(Mutex::new(Some(state))),
        }
    }

    /// Last saved state.
    pub async fn saved(&self) -> Option<PersistedHistory> {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl HistoryStorage for InMemoryHistoryStorage {
    async fn load(&self) -> Result<Option<PersistedHistory>, StorageError> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &PersistedHistory) -> Result<(), StorageError> {
        *self.state.lock().await = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_saved_state() {
        // テスト項目: clone したインスタンス間で保存内容が共有される
        // given (前提条件):
        let storage = InMemoryHistoryStorage::new();
        let observer = storage.clone();
        let state = PersistedHistory {
            head: 0,
            idx: 0,
            slots: vec![None; 3],
        };

        // when (操作):
        storage.save(&state).await.unwrap();

        // then (期待する結果):
        assert_eq!(observer.saved().await, Some(state.clone()));
        assert_eq!(observer.load().await.unwrap(), Some(state));
    }
}
