//! QuizMe HTTP Server binary

use anyhow::Context;
use quizme_core::{JsonFileStore, MemoryStore, QuizStore};
use quizme_server::{telemetry, AppState, ServerConfig};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    telemetry::init_logging(config.log_format)?;

    info!("Starting QuizMe HTTP Server v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    quizme_server::metrics::init_prometheus()?;
    quizme_server::metrics::init_metrics();

    let store: Arc<dyn QuizStore> = match &config.data_file {
        Some(path) => Arc::new(
            JsonFileStore::open(path)
                .with_context(|| format!("Failed to open quiz catalog {}", path.display()))?,
        ),
        None => {
            warn!("No data file configured (set QUIZME_DATA); serving an empty store");
            Arc::new(MemoryStore::new())
        }
    };

    quizme_server::metrics::update_loaded_quizzes(store.len());
    let state = AppState::new(store, config.cors_policy);
    let app = quizme_server::router(state);

    info!("Listening on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, shutting down gracefully...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Server shutdown complete");
    Ok(())
}
