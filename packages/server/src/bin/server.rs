//! Ringchat chat room server.
//!
//! Relays every message to every connected client and replays the latest
//! messages to clients that join.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin ringchat-server
//! cargo run --bin ringchat-server -- --host 0.0.0.0 --port 9001 --history-capacity 10
//! cargo run --bin ringchat-server -- --no-persist
//! ```

use std::path::PathBuf;

use clap::Parser;
use ringchat_server::{
    config::{self, ServerConfig},
    ui::{Server, ServerError},
};
use ringchat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "ringchat-server")]
#[command(about = "Chat room server with broadcast and history replay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "RINGCHAT_HOST", default_value = config::DEFAULT_HOST)]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "RINGCHAT_PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Number of messages replayed to joining clients
    #[arg(short = 'n', long, env = "RINGCHAT_HISTORY_CAPACITY", default_value_t = 5)]
    history_capacity: usize,

    /// File the history is persisted to
    #[arg(long, env = "RINGCHAT_STORAGE_PATH", default_value = config::DEFAULT_STORAGE_PATH)]
    storage_path: PathBuf,

    /// Keep history in memory only
    #[arg(long)]
    no_persist: bool,

    /// Fixed seed for display-name allocation
    #[arg(long, env = "RINGCHAT_NAME_SEED")]
    seed: Option<u64>,
}

impl TryFrom<Args> for ServerConfig {
    type Error = config::ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        ServerConfig::new(
            args.host,
            args.port,
            args.history_capacity,
            (!args.no_persist).then_some(args.storage_path),
            args.seed,
        )
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    let config = ServerConfig::try_from(args)?;
    tracing::info!("Starting with {:?}", config);
    Server::new(config).run().await
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
