//! Domain layer error definitions.

use thiserror::Error;

use super::value_object::ConnectionId;

/// Errors raised while allocating a display name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Every name in the allocator's space is taken
    #[error("all {space} display names are in use")]
    Exhausted { space: usize },
}

/// Errors raised while pushing a message to a connection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PushError {
    /// Connection is not in the registry
    #[error("connection '{0}' is not registered")]
    ClientNotFound(ConnectionId),

    /// Outbound channel of the connection is closed (its session has ended)
    #[error("outbound channel of connection '{0}' is closed")]
    ChannelClosed(ConnectionId),
}

/// Errors related to history persistence
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted state could not be encoded or decoded
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors surfaced to callers of the room coordinator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Coordinator loop has stopped and no longer accepts events
    #[error("room coordinator is not running")]
    CoordinatorStopped,
}
