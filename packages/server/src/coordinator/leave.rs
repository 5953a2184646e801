//! Leave: exit acknowledgement and deregistration.

use ringchat_shared::Message;

use crate::domain::ConnectionId;

use super::RoomCoordinator;

impl RoomCoordinator {
    /// Send `EXIT_OK` (best effort) and remove the connection. No-op for unknown connections.
    ///
    /// Removing the registration drops the outbound channel, so the session's
    /// pusher ends right after writing the acknowledgement.
    pub(crate) fn leave(&mut self, connection_id: ConnectionId) {
        if !self.registry.contains(&connection_id) {
            tracing::debug!("Ignoring leave of unregistered connection '{}'", connection_id);
            return;
        }

        if let Err(e) = self
            .registry
            .push_to(&connection_id, Message::exit_ok(self.clock.now()))
        {
            tracing::debug!("Exit acknowledgement not delivered: {}", e);
        }

        if let Some(client) = self.registry.remove(&connection_id) {
            tracing::info!(
                "'{}' left ({} connected)",
                client.name,
                self.registry.len()
            );
        }
    }
}
