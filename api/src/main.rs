// ./api/src/main.rs
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use api::{AppConfig, AppState, router};

// Application entry point
#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let config = AppConfig::from_env();

    // --- Dependency Injection ---
    // Stores live exactly as long as the server; state is lost on restart.
    let app_state = AppState::seeded(config.id_policy);
    info!("Application state created.");

    let app = router(app_state);
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server starting on {}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
    info!("Server shut down, in-memory stores dropped.");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        // Keep serving rather than shutting down immediately
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}
