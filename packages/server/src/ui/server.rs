//! Server execution logic.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{Router, routing::get};
use ringchat_shared::time::SystemClock;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::{ConfigError, ServerConfig},
    coordinator::RoomCoordinator,
    domain::NameAllocator,
    history::HistoryStore,
    storage::{HistoryStorage, InMemoryHistoryStorage, JsonFileHistoryStorage},
};

use super::{
    handler::{get_history, get_participants, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Errors that stop the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// WebSocket chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(ServerConfig::default());
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
}

/// Routes of the chat server
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        .route("/", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/history", get(get_history))
        .route("/api/participants", get(get_participants))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        tracing::info!("Connect to: ws://{}/ws", listener.local_addr()?);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` resolves, then stop the room and flush its history.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let storage: Arc<dyn HistoryStorage> = match &self.config.storage_path {
            Some(path) => {
                tracing::info!("Persisting history to {}", path.display());
                Arc::new(JsonFileHistoryStorage::new(path.clone()))
            }
            None => {
                tracing::info!("History persistence disabled, keeping history in memory");
                Arc::new(InMemoryHistoryStorage::new())
            }
        };

        let history = HistoryStore::load_or_init(storage, self.config.history_capacity).await;
        let allocator = match self.config.name_seed {
            Some(seed) => NameAllocator::with_seed(seed),
            None => NameAllocator::new(),
        };
        let (room, coordinator_task) =
            RoomCoordinator::new(history, allocator, Arc::new(SystemClock)).spawn();

        let app = router(Arc::new(AppState { room: room.clone() }));

        tracing::info!(
            "WebSocket chat server listening on {}",
            listener.local_addr()?
        );
        let served = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        if let Err(e) = room.shutdown().await {
            tracing::warn!("Room coordinator already stopped: {}", e);
        }
        if let Err(e) = coordinator_task.await {
            tracing::error!("Room coordinator task failed: {}", e);
        }

        served?;
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
