use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod models;
mod repositories;
mod routes;
mod services;
mod state;

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};

use crate::{
    config::AppConfig,
    repositories::{MIGRATOR, cart::PgCartStore},
    services::CartService,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = AppConfig::from_env().context("Failed to load service configuration")?;

    // RUST_LOG takes precedence over APP_LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&app_config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting shop service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool, &MIGRATOR).await?;

    let cart_service = CartService::new(Arc::new(PgCartStore::new(pool)));
    let app_state = AppState { cart_service };

    let app = routes::create_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(routes::cors_layer(app_config.cors_origin.as_deref())?);

    let address = app_config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Shop service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shop service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
