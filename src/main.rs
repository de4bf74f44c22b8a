mod api_doc;
mod config;
mod error;
mod events;
mod handlers;
mod models;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use config::{Config, Environment};
use events::LoggingObserver;
use state::AppState;
use store::StoreClient;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(Environment::from_env());

    tracing::info!("rust-redis-health starting");

    let config = Config::from_env().context("Invalid configuration")?;
    config.log_startup();

    let observer = Arc::new(LoggingObserver::new(config.environment.is_development()));
    let store = StoreClient::initialize(config.store.clone(), observer)?;

    // Open the connection early so its events show up at startup.
    let warm = store.clone();
    tokio::spawn(async move {
        if let Err(e) = warm.ping().await {
            tracing::warn!(
                "Initial ping to {}:{} failed: {}",
                warm.config().host,
                warm.config().port,
                e
            );
        }
    });

    let app = routes::router(AppState { store });

    let bind_addr = format!("{}:{}", config.service_host, config.service_port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!("Server is running on {}", listener.local_addr()?);
    if config.environment.is_development() {
        let base = format!("http://localhost:{}", config.service_port);
        tracing::info!("Health check endpoint: {}{}", base, routes::HEALTH);
        tracing::info!("Exchange endpoint: {}{}", base, routes::EXCHANGE);
        tracing::info!("API docs: {}{}", base, routes::SWAGGER_UI);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("rust-redis-health stopped");
    Ok(())
}

fn init_tracing(environment: Environment) {
    let default_level = if environment.is_development() { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down");
}
