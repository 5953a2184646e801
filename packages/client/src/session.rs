//! WebSocket client session management.

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use ringchat_shared::{EXIT_COMMAND, Message};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, protocol::Message as WsMessage},
};

use crate::{
    domain::{Input, ServerEvent, parse_input},
    error::ClientError,
    formatter::MessageFormatter,
    ui::redisplay_prompt,
};

/// Run one connection to the chat room.
///
/// Returns `Ok(())` once the server acknowledges an exit requested by the user
/// (`/exit`, or the end of input). Any other end of the connection is an error.
pub async fn run_client_session(
    url: &str,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(url).await.map_err(|e| match e {
        WsError::Url(e) => ClientError::InvalidUrl(e.to_string()),
        e => ClientError::ConnectionError(e.to_string()),
    })?;
    tracing::info!("Connected to chat server!");

    let (mut write, mut read) = ws_stream.split();
    let mut name = String::new();
    let mut exit_requested = false;

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    let message = match serde_json::from_str::<Message>(text.as_str()) {
                        Ok(message) => message,
                        Err(e) => {
                            tracing::warn!("Skipping malformed message: {}", e);
                            continue;
                        }
                    };
                    match ServerEvent::from(message) {
                        ServerEvent::Entered(assigned) => {
                            print!("{}", MessageFormatter::format_entered(&assigned));
                            name = assigned;
                        }
                        ServerEvent::Exited => {
                            print!("{}", MessageFormatter::format_exited());
                            return Ok(());
                        }
                        ServerEvent::Chat(message) => {
                            print!("\n{}", MessageFormatter::format_chat_message(&message));
                        }
                    }
                    redisplay_prompt();
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt();
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    return Err(ClientError::ConnectionLost);
                }
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return Err(ClientError::ConnectionError(e.to_string()));
                }
                Some(Ok(_)) => {}
            },
            line = input.recv(), if !exit_requested => {
                let text = match line.as_deref().map(parse_input) {
                    Some(None) => continue,
                    Some(Some(Input::Chat(text))) => text,
                    Some(Some(Input::Exit)) | None => {
                        exit_requested = true;
                        EXIT_COMMAND.to_string()
                    }
                };

                let message = Message::chat(text, name.as_str(), Utc::now());
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };

                if let Err(e) = write.send(WsMessage::Text(json.into())).await {
                    tracing::warn!("Failed to send message: {}", e);
                    return Err(ClientError::ConnectionError(e.to_string()));
                }
            }
        }
    }
}
