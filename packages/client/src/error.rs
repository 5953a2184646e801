//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Server URL cannot be used
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Server closed the connection without acknowledging an exit
    #[error("Connection closed by server")]
    ConnectionLost,

    /// Reconnection attempts used up
    #[error("Failed to reconnect after {0} attempts")]
    ReconnectExhausted(u32),
}
