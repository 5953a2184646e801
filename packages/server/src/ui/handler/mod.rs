//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

pub use http::{get_history, get_participants, health_check};
pub use websocket::websocket_handler;
