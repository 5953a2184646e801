//! Ringchat server: a single chat room that relays every message to every
//! connected client and replays the most recent messages to newcomers.

pub mod config;
pub mod coordinator;
pub mod domain;
pub mod history;
pub mod storage;
pub mod ui;
