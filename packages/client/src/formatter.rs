//! Message formatting utilities for client display.

use ringchat_shared::{Message, time::format_display_time};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a chat message as `sender [dd-mm HH:MM]:` followed by the text on its own line
    pub fn format_chat_message(message: &Message) -> String {
        format!(
            "{} [{}]: \n{}\n",
            message.sender_id,
            format_display_time(message.timestamp),
            message.text
        )
    }

    /// Format the join acknowledgement
    pub fn format_entered(name: &str) -> String {
        format!(
            "\nYou are '{}'. Type messages and press Enter to send, /exit to leave.\n\n",
            name
        )
    }

    /// Format the exit acknowledgement
    pub fn format_exited() -> String {
        "\nYou left the room.\n".to_string()
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_format_chat_message() {
        // テスト項目: チャットメッセージが「送信者 [日-月 時:分]:」の後に本文が続く形式になる
        // given (前提条件):
        let sent_at = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let message = Message::chat("hello", "u0042", sent_at);

        // when (操作):
        let result = MessageFormatter::format_chat_message(&message);

        // then (期待する結果):
        assert_eq!(
            result,
            format!("u0042 [{}]: \nhello\n", format_display_time(sent_at))
        );
    }

    #[test]
    fn test_format_entered_contains_name() {
        // テスト項目: 参加通知に割り当てられた名前と退出方法が含まれる
        // given (前提条件):
        let name = "u1234";

        // when (操作):
        let result = MessageFormatter::format_entered(name);

        // then (期待する結果):
        assert!(result.contains("'u1234'"));
        assert!(result.contains("/exit"));
    }

    #[test]
    fn test_format_binary_message() {
        // テスト項目: バイナリメッセージの通知にバイト数が含まれる
        // given (前提条件):
        let byte_count = 42;

        // when (操作):
        let result = MessageFormatter::format_binary_message(byte_count);

        // then (期待する結果):
        assert!(result.contains("42 bytes"));
    }
}
