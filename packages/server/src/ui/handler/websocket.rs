//! WebSocket connection handler: one session per accepted connection.
//!
//! A session owns its socket and nothing else. It forwards inbound envelopes to
//! the room coordinator and drains its outbound channel into the socket; all
//! room state changes happen on the coordinator.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{
        ConnectInfo, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use ringchat_shared::{Message, MessageCode};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{coordinator::RoomHandle, domain::ConnectionId, ui::state::AppState};

/// How long a departing session waits for `EXIT_OK` to be written.
const EXIT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, remote))
}

/// Spawns a task that writes every queued envelope to the socket as a text frame.
///
/// The task closes the socket after writing `EXIT_OK`, or once the coordinator
/// drops the sending half (leave, refused join, shutdown).
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<Message>,
    mut sender: SplitSink<WebSocket, WsMessage>,
    connection_id: ConnectionId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to encode message for '{}': {}", connection_id, e);
                    continue;
                }
            };

            if let Err(e) = sender.send(WsMessage::Text(json.into())).await {
                tracing::debug!("Write to '{}' failed: {}", connection_id, e);
                return;
            }

            if message.code == MessageCode::ExitOk {
                break;
            }
        }

        if let Err(e) = sender.close().await {
            tracing::debug!("Failed to close socket of '{}': {}", connection_id, e);
        }
    })
}

/// Spawns a task that forwards inbound envelopes to the coordinator.
///
/// Ends on `/exit`, a close frame, a read error, or when the coordinator has stopped.
fn reader_loop(
    mut receiver: SplitStream<WebSocket>,
    room: RoomHandle,
    connection_id: ConnectionId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::info!("Read from '{}' failed: {}", connection_id, e);
                    break;
                }
            };

            match frame {
                WsMessage::Text(text) => {
                    let message = match serde_json::from_str::<Message>(text.as_str()) {
                        Ok(message) => message,
                        Err(e) => {
                            tracing::warn!(
                                "Skipping malformed frame from '{}': {}",
                                connection_id,
                                e
                            );
                            continue;
                        }
                    };

                    if message.is_exit_request() {
                        tracing::info!("Connection '{}' requested exit", connection_id);
                        break;
                    }

                    tracing::debug!("Received from '{}': {}", connection_id, message.text);
                    if room.deliver(connection_id, message).is_err() {
                        break;
                    }
                }
                WsMessage::Binary(data) => {
                    tracing::debug!(
                        "Ignoring {} byte binary frame from '{}'",
                        data.len(),
                        connection_id
                    );
                }
                WsMessage::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    })
}

fn request_leave(room: &RoomHandle, connection_id: ConnectionId) {
    if let Err(e) = room.leave(connection_id) {
        tracing::debug!("Leave of '{}' not enqueued: {}", connection_id, e);
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, remote: SocketAddr) {
    let connection_id = ConnectionId::generate();
    tracing::info!("Connection '{}' accepted from {}", connection_id, remote);

    let (tx, rx) = mpsc::unbounded_channel();
    if let Err(e) = state.room.join(connection_id, tx) {
        tracing::warn!("Rejecting connection '{}': {}", connection_id, e);
        return;
    }

    let (sender, receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender, connection_id);
    let mut recv_task = reader_loop(receiver, state.room.clone(), connection_id);

    // Leave is enqueued exactly once, whichever side ends first
    tokio::select! {
        _ = &mut recv_task => {
            request_leave(&state.room, connection_id);
            if tokio::time::timeout(EXIT_FLUSH_TIMEOUT, &mut send_task).await.is_err() {
                tracing::debug!("Exit acknowledgement to '{}' timed out", connection_id);
                send_task.abort();
            }
        }
        _ = &mut send_task => {
            recv_task.abort();
            request_leave(&state.room, connection_id);
        }
    }

    tracing::info!("Connection '{}' from {} closed", connection_id, remote);
}
