//! Shared building blocks for the Ringchat server and client.
//!
//! - `message`: the JSON envelope exchanged over the WebSocket
//! - `time`: clock abstraction and display formatting
//! - `logger`: tracing subscriber setup for the binaries

pub mod logger;
pub mod message;
pub mod time;

pub use message::{EXIT_COMMAND, Message, MessageCode};
