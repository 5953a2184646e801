//! Ringchat CLI chat client.
//!
//! Connects to a chat room server, prints everything the room broadcasts and
//! sends every line typed on stdin. `/exit` (or Ctrl+D) leaves the room.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin ringchat-client
//! cargo run --bin ringchat-client -- --url ws://127.0.0.1:9001/ws
//! ```

use clap::Parser;

use ringchat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "ringchat-client")]
#[command(about = "Chat room client with history replay", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(
        short = 'u',
        long,
        env = "RINGCHAT_URL",
        default_value = "ws://127.0.0.1:9001/ws"
    )]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = ringchat_client::run_client(args.url).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
