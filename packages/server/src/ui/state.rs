//! Server state shared by the handlers.

use crate::coordinator::RoomHandle;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event queue of the room coordinator
    pub room: RoomHandle,
}
