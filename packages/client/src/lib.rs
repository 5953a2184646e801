//! Ringchat CLI client.
//!
//! Reads lines from stdin, sends them to the chat room and prints everything
//! the room broadcasts.

pub mod domain;
pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod ui;

pub use runner::run_client;
