//! JSON file を使った HistoryStorage 実装
//!
//! 書き込みは一時ファイルに書いてから rename するため、途中でプロセスが落ちても
//! 既存のファイルが壊れることはありません。

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::StorageError;

use super::{HistoryStorage, PersistedHistory, StoredLayout};

/// History persisted as a single pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileHistoryStorage {
    path: PathBuf,
}

impl JsonFileHistoryStorage {
    /// Storage backed by the file at `path`. The file is not touched until the first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }
}

#[async_trait]
impl HistoryStorage for JsonFileHistoryStorage {
    async fn load(&self) -> Result<Option<PersistedHistory>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // 空ファイルは「まだ何も保存されていない」とみなす
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let layout: StoredLayout = serde_json::from_slice(&bytes)?;
        Ok(Some(layout.into()))
    }

    async fn save(&self, state: &PersistedHistory) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(state)?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::debug!(
            "Persisted history ({} messages) to {}",
            state.populated(),
            self.path.display()
        );
        Ok(())
    }
}
