use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sibia_gateway::backend::BackendClient;
use sibia_gateway::common::AppState;
use sibia_gateway::config::Config;
use sibia_gateway::poll;
use sibia_gateway::routes;
use sibia_gateway::services::monitor::ConnectivityMonitor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sibia_gateway=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sibia-gateway...");

    // Load configuration (fail-fast)
    let config = Config::from_env()?;
    tracing::info!(
        backend = %config.backend_base_url,
        host = %config.api_host,
        port = config.api_port,
        sensors = config.sensor_tags.len(),
        "Configuration loaded"
    );

    // Create backend client
    let backend = BackendClient::new(&config);
    tracing::info!("Backend client initialized");

    // Create application state
    let state = AppState::new(config.clone(), backend);

    // Spawn background tasks (fire-and-forget, non-blocking)
    tracing::info!("Spawning connectivity monitor and poll scheduler...");
    tokio::spawn(ConnectivityMonitor::run(state.monitor.clone()));
    tokio::spawn(poll::scheduler::run_poller(state.clone()));

    // Build router
    let app = routes::build_router(state);

    // Start server with graceful shutdown
    let addr = config.bind_address();
    tracing::info!(address = %addr, "Starting server");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
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
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
