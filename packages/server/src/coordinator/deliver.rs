//! Deliver: append to history, then fan out to every connection.

use ringchat_shared::Message;

use crate::domain::ConnectionId;

use super::RoomCoordinator;

impl RoomCoordinator {
    /// Record `message` and broadcast it to every registered connection, the sender included.
    ///
    /// The message is attributed to the display name registered for
    /// `connection_id`. Messages from unregistered connections are dropped, and
    /// the `/exit` sentinel is turned into a leave instead of being broadcast.
    pub(crate) fn deliver(&mut self, connection_id: ConnectionId, message: Message) {
        if message.is_exit_request() {
            self.leave(connection_id);
            return;
        }

        let Some(name) = self.registry.name_of(&connection_id) else {
            tracing::warn!(
                "Dropping message from unregistered connection '{}'",
                connection_id
            );
            return;
        };
        let message = message.attributed_to(name.as_str());

        self.history.append(message.clone());
        let delivered = self.registry.broadcast(&message);

        tracing::debug!(
            "Broadcasted message from '{}' to {}/{} connections",
            message.sender_id,
            delivered,
            self.registry.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use ringchat_shared::MessageCode;

    use super::super::test_support::*;
    use super::*;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 送信者を含む全接続にブロードキャストされること
    // - 全ての受信者が同じ順序でメッセージを観測すること
    // - 一部の送信失敗が他の受信者への配信や登録状態に影響しないこと
    // - "/exit" がブロードキャストされず leave として扱われること
    // ========================================

    #[tokio::test]
    async fn test_deliver_broadcasts_to_everyone_including_sender() {
        // テスト項目: メッセージが送信者自身を含む全員に届き、送信者名が付与される
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(5).await;
        let (alice, mut alice_rx, alice_received) = join_client(&mut coordinator);
        let (_bob, mut bob_rx, _) = join_client(&mut coordinator);
        let alice_name = alice_received[0].text.clone();

        // when (操作):
        let mut spoofed = chat("hello", 1);
        spoofed.sender_id = "someone-else".to_string();
        coordinator.deliver(alice, spoofed);

        // then (期待する結果):
        for rx in [&mut alice_rx, &mut bob_rx] {
            let received = drain(rx);
            assert_eq!(received.len(), 1);
            assert_eq!(received[0].text, "hello");
            assert_eq!(received[0].sender_id, alice_name);
            assert_eq!(received[0].code, MessageCode::Ok);
            assert_eq!(received[0].timestamp, chat("", 1).timestamp);
        }
        assert_eq!(coordinator.history.len(), 1);
    }

    #[tokio::test]
    async fn test_all_observers_see_identical_order() {
        // テスト項目: 2 人のクライアントの送信が全ての受信者に同じ順序で届く
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(5).await;
        let (alice, mut alice_rx, _) = join_client(&mut coordinator);
        let (bob, mut bob_rx, _) = join_client(&mut coordinator);
        let (_carol, mut carol_rx, _) = join_client(&mut coordinator);

        // when (操作): 送信が交互に到着する
        coordinator.deliver(alice, chat("a1", 1));
        coordinator.deliver(bob, chat("b1", 2));
        coordinator.deliver(alice, chat("a2", 3));
        coordinator.deliver(bob, chat("b2", 4));

        // then (期待する結果):
        let expected = ["a1", "b1", "a2", "b2"];
        for rx in [&mut alice_rx, &mut bob_rx, &mut carol_rx] {
            let texts: Vec<_> = drain(rx).into_iter().map(|m| m.text).collect();
            assert_eq!(texts, expected);
        }
        let history: Vec<_> = coordinator
            .history
            .snapshot()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(history, expected);
    }

    #[tokio::test]
    async fn test_broadcast_failure_does_not_abort_or_remove() {
        // テスト項目: 1 人への送信に失敗しても他の受信者には届き、失敗した接続も登録されたまま
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(5).await;
        let (alice, mut alice_rx, _) = join_client(&mut coordinator);
        let (bob, bob_rx, _) = join_client(&mut coordinator);
        let (_carol, mut carol_rx, _) = join_client(&mut coordinator);
        drop(bob_rx);

        // when (操作):
        coordinator.deliver(alice, chat("hi", 1));

        // then (期待する結果):
        assert_eq!(drain(&mut alice_rx).len(), 1);
        assert_eq!(drain(&mut carol_rx).len(), 1);
        assert!(coordinator.registry.contains(&bob));
        assert_eq!(coordinator.registry.len(), 3);
    }

    #[tokio::test]
    async fn test_exit_sentinel_is_never_broadcast() {
        // テスト項目: "/exit" は他のクライアントに届かず、送信者には EXIT_OK が 1 件だけ届く
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(5).await;
        let (alice, mut alice_rx, _) = join_client(&mut coordinator);
        let (_bob, mut bob_rx, _) = join_client(&mut coordinator);

        // when (操作):
        coordinator.deliver(alice, chat("/exit", 1));

        // then (期待する結果):
        assert!(drain(&mut bob_rx).is_empty());
        let received = drain(&mut alice_rx);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].code, MessageCode::ExitOk);
        assert!(!coordinator.registry.contains(&alice));
        assert!(coordinator.history.is_empty());
    }

    #[tokio::test]
    async fn test_message_from_unregistered_connection_is_dropped() {
        // テスト項目: 未登録の接続からのメッセージは履歴にも配信にも反映されない
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(5).await;
        let (_alice, mut alice_rx, _) = join_client(&mut coordinator);

        // when (操作):
        coordinator.deliver(ConnectionId::generate(), chat("ghost", 1));

        // then (期待する結果):
        assert!(drain(&mut alice_rx).is_empty());
        assert!(coordinator.history.is_empty());
    }
}
