//! Server configuration.

use std::{num::NonZeroUsize, path::PathBuf};

use thiserror::Error;

use crate::history::DEFAULT_HISTORY_CAPACITY;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9001;
pub const DEFAULT_STORAGE_PATH: &str = "./data/history.json";

/// Errors raised while validating configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("history capacity must be at least 1")]
    ZeroHistoryCapacity,
}

/// Validated server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of messages kept for replay
    pub history_capacity: NonZeroUsize,
    /// History file; `None` keeps history in memory only
    pub storage_path: Option<PathBuf>,
    /// Fixed seed for display-name allocation
    pub name_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            storage_path: Some(PathBuf::from(DEFAULT_STORAGE_PATH)),
            name_seed: None,
        }
    }
}

impl ServerConfig {
    /// Build a config from raw values, rejecting a zero capacity.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        history_capacity: usize,
        storage_path: Option<PathBuf>,
        name_seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let history_capacity =
            NonZeroUsize::new(history_capacity).ok_or(ConfigError::ZeroHistoryCapacity)?;
        Ok(Self {
            host: host.into(),
            port,
            history_capacity,
            storage_path,
            name_seed,
        })
    }

    /// `host:port`, resolved when the listener binds
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // テスト項目: デフォルト設定の値
        // given (前提条件):
        let config = ServerConfig::default();

        // when (操作):
        let addr = config.bind_addr();

        // then (期待する結果):
        assert_eq!(addr, "127.0.0.1:9001");
        assert_eq!(config.history_capacity.get(), 5);
        assert_eq!(
            config.storage_path.as_deref(),
            Some(std::path::Path::new("./data/history.json"))
        );
        assert_eq!(config.name_seed, None);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        // テスト項目: 履歴容量 0 はエラーになる
        // given (前提条件):
        // when (操作):
        let result = ServerConfig::new("127.0.0.1", 9001, 0, None, None);

        // then (期待する結果):
        assert_eq!(result, Err(ConfigError::ZeroHistoryCapacity));
    }
}
