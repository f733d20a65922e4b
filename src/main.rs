//! Timer Sync - An authoritative countdown timer server with real-time state sync
//!
//! This is the main entry point for the timer-sync server.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use timer_sync::{
    api::create_router,
    config::Config,
    state::{AppState, TimerStore},
    tasks::tick_scheduler_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timer_sync={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timer-sync server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, static_dir={:?}",
          config.host, config.port, config.static_dir);

    // Timers live for the lifetime of the process and start from defaults
    let store = TimerStore::with_defaults();
    info!("Initialized {} timers", store.len());
    let state = Arc::new(AppState::new(store));

    // Start the shared tick loop
    let tick_state = Arc::clone(&state);
    tokio::spawn(async move {
        tick_scheduler_task(tick_state).await;
    });

    let app = create_router(state, config.static_dir.as_deref());

    // Failing to bind is the only fatal startup error
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET /ws     - Timer sync WebSocket (stateUpdate / updateTimer)");
    info!("  GET /health - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
