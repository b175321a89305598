//! Books Server
//!
//! REST API for a book catalog.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use books_api::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::{BookRepository, BooksRepository},
    server, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration (is DATABASE_URL set?)")?;

    init_tracing(&config.logging);

    tracing::info!("Starting Books Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    let repository = BooksRepository::new(pool.clone());

    tokio::time::timeout(config.database.acquire_timeout(), repository.ping())
        .await
        .context("Database ping timed out")?
        .context("Database unreachable")?;

    tracing::info!("Connected to database");

    let state = AppState::new(Arc::new(repository));
    let app = api::create_router(state, config.server.request_timeout());

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);

    let served = server::serve(
        listener,
        app,
        server::shutdown_signal(),
        config.shutdown.grace_period(),
    )
    .await;

    // Connections held by cancelled requests must not stall the exit
    if tokio::time::timeout(config.shutdown.grace_period(), pool.close())
        .await
        .is_err()
    {
        tracing::warn!("Database pool did not close within the grace period");
    } else {
        tracing::info!("Database connections closed");
    }

    served
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("books_api={},tower_http=debug", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
