//! Join: name allocation, registration, entry acknowledgement and history replay.

use ringchat_shared::{Message, MessageCode};

use crate::domain::ConnectionId;

use super::{PusherChannel, RoomCoordinator};

impl RoomCoordinator {
    /// Register `connection_id` under a fresh display name.
    ///
    /// The connection receives `ENTRY_OK` carrying its name, then the current
    /// history oldest first. Both go out before any later event is processed,
    /// so the replay always precedes live messages. Send failures are logged;
    /// the session notices the dead socket on its own and leaves.
    pub(crate) fn join(&mut self, connection_id: ConnectionId, sender: PusherChannel) {
        if self.registry.remove(&connection_id).is_some() {
            tracing::warn!(
                "Connection '{}' joined twice, replacing the previous registration",
                connection_id
            );
        }

        let name = match self.allocator.allocate(&self.registry.names()) {
            Ok(name) => name,
            Err(e) => {
                // sender is dropped here, which closes the session's socket
                tracing::error!("Refusing connection '{}': {}", connection_id, e);
                return;
            }
        };

        self.registry.insert(connection_id, name.clone(), sender);

        let ack = Message::entry_ok(name.as_str(), self.clock.now());
        if let Err(e) = self.registry.push_to(&connection_id, ack) {
            tracing::warn!("Failed to send entry acknowledgement to '{}': {}", name, e);
        }

        let replay = self.history.snapshot();
        let replayed = replay.len();
        for message in replay {
            let message = Message {
                code: MessageCode::Ok,
                ..message
            };
            if let Err(e) = self.registry.push_to(&connection_id, message) {
                tracing::warn!("Failed to replay history to '{}': {}", name, e);
                break;
            }
        }

        tracing::info!(
            "'{}' joined as connection '{}' ({} connected, {} messages replayed)",
            name,
            connection_id,
            self.registry.len(),
            replayed
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use ringchat_shared::MessageCode;
    use tokio::sync::mpsc;

    use super::super::test_support::*;
    use super::*;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - join 時に ENTRY_OK（割り当てられた名前）が最初に届くこと
    // - 履歴が古い順にリプレイされ、送信者・時刻・本文が保持されること
    // - 割り当てられる名前が登録中の接続間で重複しないこと
    // - 送信失敗があっても登録自体は行われること
    // ========================================

    #[tokio::test]
    async fn test_join_sends_entry_ok_with_assigned_name() {
        // テスト項目: 参加直後に ENTRY_OK が届き、text が割り当てられた名前になる
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(5).await;

        // when (操作):
        let (alice, _rx, received) = join_client(&mut coordinator);

        // then (期待する結果):
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].code, MessageCode::EntryOk);
        assert_eq!(received[0].sender_id, "");
        assert_eq!(received[0].timestamp, fixed_time());
        let name = coordinator.registry.name_of(&alice).unwrap();
        assert_eq!(received[0].text, name.as_str());
    }

    #[tokio::test]
    async fn test_join_after_five_messages_replays_them_oldest_first() {
        // テスト項目: 容量 5 で 5 件保存済みの場合、新規参加者は 5 件全てを古い順に受け取る
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(5).await;
        let (alice, _alice_rx, _) = join_client(&mut coordinator);
        let alice_name = coordinator.registry.name_of(&alice).unwrap().clone();
        for (minute, text) in ["m1", "m2", "m3", "m4", "m5"].into_iter().enumerate() {
            coordinator.deliver(alice, chat(text, minute as u32));
        }

        // when (操作):
        let (_bob, _bob_rx, received) = join_client(&mut coordinator);

        // then (期待する結果):
        assert_eq!(received.len(), 6);
        assert_eq!(received[0].code, MessageCode::EntryOk);
        let replay = &received[1..];
        let texts: Vec<_> = replay.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["m1", "m2", "m3", "m4", "m5"]);
        for (minute, message) in replay.iter().enumerate() {
            assert_eq!(message.code, MessageCode::Ok);
            assert_eq!(message.sender_id, alice_name.as_str());
            assert_eq!(message.timestamp, chat("", minute as u32).timestamp);
        }
    }

    #[tokio::test]
    async fn test_join_replays_only_latest_capacity_messages() {
        // テスト項目: 容量を超えて送信された場合、最新の N 件だけがリプレイされる
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(3).await;
        let (alice, _alice_rx, _) = join_client(&mut coordinator);
        for (minute, text) in ["m1", "m2", "m3", "m4", "m5"].into_iter().enumerate() {
            coordinator.deliver(alice, chat(text, minute as u32));
        }

        // when (操作):
        let (_bob, _bob_rx, received) = join_client(&mut coordinator);

        // then (期待する結果):
        let texts: Vec<_> = received[1..].iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["m3", "m4", "m5"]);
    }

    #[tokio::test]
    async fn test_replay_precedes_later_live_messages() {
        // テスト項目: リプレイは参加後に送信されたメッセージより必ず先に届く
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(5).await;
        let (alice, _alice_rx, _) = join_client(&mut coordinator);
        coordinator.deliver(alice, chat("old", 1));

        // when (操作):
        let (_bob, mut bob_rx, mut received) = join_client(&mut coordinator);
        coordinator.deliver(alice, chat("new", 2));
        received.extend(drain(&mut bob_rx));

        // then (期待する結果):
        let texts: Vec<_> = received[1..].iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["old", "new"]);
    }

    #[tokio::test]
    async fn test_assigned_names_are_pairwise_distinct() {
        // テスト項目: 登録中の接続に割り当てられた名前は全て異なる
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(5).await;

        // when (操作):
        let receivers: Vec<_> = (0..200).map(|_| join_client(&mut coordinator)).collect();

        // then (期待する結果):
        let names: HashSet<_> = receivers
            .iter()
            .map(|(_, _, received)| received[0].text.clone())
            .collect();
        assert_eq!(names.len(), 200);
        assert_eq!(coordinator.registry.len(), 200);
    }

    #[tokio::test]
    async fn test_join_with_closed_channel_still_registers() {
        // テスト項目: ENTRY_OK の送信に失敗しても登録は行われる（leave は読み込み失敗時に発生する）
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(5).await;
        let connection_id = ConnectionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        // when (操作):
        coordinator.join(connection_id, tx);

        // then (期待する結果):
        assert!(coordinator.registry.contains(&connection_id));
    }

    #[tokio::test]
    async fn test_rejoin_with_same_identity_replaces_registration() {
        // テスト項目: 同じ接続 ID で再度 join した場合は古い登録が置き換えられる
        // given (前提条件):
        let mut coordinator = coordinator_with_capacity(5).await;
        let connection_id = ConnectionId::generate();
        let (old_tx, mut old_rx) = mpsc::unbounded_channel();
        coordinator.join(connection_id, old_tx);
        drain(&mut old_rx);

        // when (操作):
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();
        coordinator.join(connection_id, new_tx);

        // then (期待する結果):
        assert_eq!(coordinator.registry.len(), 1);
        assert!(matches!(
            old_rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        assert_eq!(new_rx.try_recv().unwrap().code, MessageCode::EntryOk);
    }
}
