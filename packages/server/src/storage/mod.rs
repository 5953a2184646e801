//! History persistence.
//!
//! ## 概要
//!
//! `HistoryStorage` は履歴リングバッファの永続化先を抽象化する trait です。
//! `HistoryStore` だけがこの trait を通して書き込みます。
//!
//! ## 実装
//!
//! - `json_file`: JSON ファイルへのアトミックな書き込み
//! - `memory`: テストや `--no-persist` 用のインメモリ実装

pub mod json_file;
pub mod memory;

use async_trait::async_trait;
use ringchat_shared::Message;
use serde::{Deserialize, Serialize};

use crate::domain::StorageError;

pub use json_file::JsonFileHistoryStorage;
pub use memory::InMemoryHistoryStorage;

/// Durable image of the history ring.
///
/// `slots` has one entry per ring position; `None` marks a slot that was never written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedHistory {
    pub head: usize,
    pub idx: usize,
    pub slots: Vec<Option<Message>>,
}

impl PersistedHistory {
    /// Number of populated slots.
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Populated slots walked from `head`, wrapping around once.
    ///
    /// Used to re-linearise state whose indices cannot be trusted.
    pub fn ordered_messages(&self) -> Vec<Message> {
        let len = self.slots.len();
        if len == 0 {
            return Vec::new();
        }
        let start = if self.head < len { self.head } else { 0 };
        (0..len)
            .filter_map(|offset| self.slots[(start + offset) % len].clone())
            .collect()
    }
}

/// On-disk layouts accepted when loading.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredLayout {
    /// Current layout: ring indices plus slots
    Ring(PersistedHistory),
    /// Flat array of messages, oldest first
    Legacy(Vec<Message>),
}

impl From<StoredLayout> for PersistedHistory {
    fn from(layout: StoredLayout) -> Self {
        match layout {
            StoredLayout::Ring(state) => state,
            StoredLayout::Legacy(messages) => {
                let idx = messages.len();
                PersistedHistory {
                    head: 0,
                    idx,
                    slots: messages.into_iter().map(Some).collect(),
                }
            }
        }
    }
}

/// Persistence backend for the message history.
///
/// Implementations own one durable record and overwrite it on every save.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStorage: Send + Sync {
    /// Load the persisted history. `Ok(None)` when nothing has been stored yet.
    async fn load(&self) -> Result<Option<PersistedHistory>, StorageError>;

    /// Replace the persisted history with `state`.
    async fn save(&self, state: &PersistedHistory) -> Result<(), StorageError>;
}
