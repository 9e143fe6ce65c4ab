use expense_tracker_backend::{
    config::AppConfig, create_router, initialize_backend, logging::init_tracing,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the variables directly
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = AppConfig::load()?;
    init_tracing(&config)?;
    if !dotenv_loaded {
        info!("No .env file found, using process environment only");
    }

    info!(
        "Starting expense tracker ({:?}) with database {}",
        config.environment, config.database_url
    );
    let app_state = initialize_backend(&config).await?;
    let app = create_router(app_state, &config)?;

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
