//! Client execution logic with reconnection support.

use std::time::Duration;

use crate::{
    domain::should_attempt_reconnect, error::ClientError, session::run_client_session,
    ui::spawn_input_reader,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the chat client with reconnection logic
pub async fn run_client(url: String) -> Result<(), ClientError> {
    let mut input = spawn_input_reader();
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} (attempt {}/{})",
            url,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&url, &mut input).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);

                if !should_attempt_reconnect(&e, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
                    tracing::error!("Giving up: {}", e);
                    return match e {
                        ClientError::InvalidUrl(_) => Err(e),
                        _ => Err(ClientError::ReconnectExhausted(MAX_RECONNECT_ATTEMPTS)),
                    };
                }
                reconnect_count += 1;

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }
}
