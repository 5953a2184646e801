//! Domain logic for client-side operations.
//!
//! Pure functions without side effects, so they are easy to test.

use ringchat_shared::{EXIT_COMMAND, Message, MessageCode};

use crate::error::ClientError;

/// What a line typed by the user asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Send the text as a chat message
    Chat(String),
    /// Leave the room
    Exit,
}

/// Classify a line from stdin. Whitespace-only lines are ignored, and chat text is sent as typed.
///
/// Only an exact `/exit` leaves, matching the server's check.
pub fn parse_input(line: &str) -> Option<Input> {
    if line.trim().is_empty() {
        None
    } else if line == EXIT_COMMAND {
        Some(Input::Exit)
    } else {
        Some(Input::Chat(line.to_string()))
    }
}

/// Envelope received from the server, by intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Join acknowledged; carries the assigned display name
    Entered(String),
    /// Exit acknowledged
    Exited,
    /// Chat message (live or replayed)
    Chat(Message),
}

impl From<Message> for ServerEvent {
    fn from(message: Message) -> Self {
        match message.code {
            MessageCode::EntryOk => ServerEvent::Entered(message.text),
            MessageCode::ExitOk => ServerEvent::Exited,
            MessageCode::Ok => ServerEvent::Chat(message),
        }
    }
}

/// Check if the client should exit immediately based on the error type.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::InvalidUrl(_) | ClientError::ReconnectExhausted(_)
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}
