use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use realty_backend_core::{build_router, initialize_app_state, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before reading RUST_LOG
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_address = config.server.bind_address.clone();
    info!(
        "Starting realty back office API on {} ({})",
        bind_address, config.server.environment
    );

    let state = initialize_app_state(config)
        .await
        .map_err(|e| anyhow::anyhow!("Initialization failed: {}", e))?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
