//! Domain layer: value objects, name allocation and error definitions.
//!
//! Nothing in here touches sockets, files or tasks.

pub mod error;
pub mod name_allocator;
pub mod value_object;

pub use error::{NameError, PushError, RoomError, StorageError};
pub use name_allocator::NameAllocator;
pub use value_object::{ConnectionId, DisplayName};
