//! Wire envelope exchanged between clients and the server.
//!
//! Every WebSocket text frame carries exactly one JSON-encoded [`Message`]:
//!
//! ```text
//! {"text":"hello","timestamp":"2020-01-01T01:01:01Z","senderid":"u0042","code":"OK"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client input that requests a graceful departure instead of a broadcast.
pub const EXIT_COMMAND: &str = "/exit";

/// Intent of an envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCode {
    /// Ordinary chat message.
    #[default]
    Ok,
    /// Server → client, once after a successful join. `text` carries the assigned name.
    EntryOk,
    /// Server → client, once right before the connection is removed.
    ExitOk,
}

/// Chat envelope.
///
/// Inbound envelopes may omit `senderid`, `code` and `timestamp`; the missing
/// fields fall back to an empty sender, [`MessageCode::Ok`] and the receipt time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "senderid", default)]
    pub sender_id: String,
    #[serde(default)]
    pub code: MessageCode,
}

impl Message {
    /// Ordinary chat message.
    pub fn chat(
        text: impl Into<String>,
        sender_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            text: text.into(),
            timestamp,
            sender_id: sender_id.into(),
            code: MessageCode::Ok,
        }
    }

    /// Entry acknowledgement carrying the display name assigned by the server.
    pub fn entry_ok(display_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            text: display_name.into(),
            timestamp,
            sender_id: String::new(),
            code: MessageCode::EntryOk,
        }
    }

    /// Exit acknowledgement.
    pub fn exit_ok(timestamp: DateTime<Utc>) -> Self {
        Self {
            text: String::new(),
            timestamp,
            sender_id: String::new(),
            code: MessageCode::ExitOk,
        }
    }

    /// Whether the payload is the departure sentinel. Only an exact match counts.
    pub fn is_exit_request(&self) -> bool {
        self.text == EXIT_COMMAND
    }

    /// Same message re-attributed as an `OK` chat message from `sender_id`.
    pub fn attributed_to(self, sender_id: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            code: MessageCode::Ok,
            ..self
        }
    }
}
