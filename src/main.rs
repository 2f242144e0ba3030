//! Campus Cache - in-memory caching and request coordination for
//! learning-platform dashboards

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_cache::api::create_router;
use campus_cache::{spawn_coordinator_cleanup_task, spawn_sweep_task, AppState, Config};

/// Main entry point for the Campus Cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the domain cache registry and request coordinator
/// 4. Start the background sweep and coordinator cleanup tasks
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Campus Cache service");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, sweep_interval={}s, cleanup_interval={}s",
        config.server_port, config.sweep_interval_secs, config.coordinator_cleanup_interval_secs
    );

    // Create application state: registry + coordinator
    let state = AppState::from_config(config.clone());
    info!("Cache registry initialized");

    // Start background maintenance tasks
    let sweep_handle = spawn_sweep_task(
        Arc::clone(&state.registry),
        Duration::from_secs(config.sweep_interval_secs),
    );
    let cleanup_handle = spawn_coordinator_cleanup_task(
        state.coordinator.clone(),
        Duration::from_secs(config.coordinator_cleanup_interval_secs),
        Duration::from_millis(config.coordinator_max_age_ms),
    );
    info!("Background maintenance tasks started");

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(vec![sweep_handle, cleanup_handle]))
        .await
        .unwrap();

    info!("Server shutdown complete");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the background tasks and allows graceful
/// shutdown.
async fn shutdown_signal(task_handles: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    // Abort the background tasks
    for handle in task_handles {
        handle.abort();
    }
    warn!("Background maintenance tasks aborted");
}
