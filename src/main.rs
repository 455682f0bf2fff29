//! BonzShop Coin Service - Main Application Entry Point
//!
//! REST API backing the BonzShop storefront: coin wallets, coin purchases of
//! game accounts and products, the admin review queue for top-ups, bot
//! rentals and withdrawals, referrals, and order notifications.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries), behind `ShopStore`
//! - **Authentication**: bearer session tokens with SHA-256 hashing
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build the store, the outbound notifier and the router
//! 5. Start server on configured port

mod app;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    app::AppState,
    services::notifier::OutboundNotifier,
    store::{PgShopStore, ShopStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let store: Arc<dyn ShopStore> = Arc::new(PgShopStore::new(pool));
    let notifier = OutboundNotifier::new(&config, store.clone())?;
    if config.email_webhook_url.is_none() {
        tracing::info!("EMAIL_WEBHOOK_URL not set, order emails disabled");
    }
    if config.telegram().is_none() {
        tracing::info!("Telegram not configured, order alerts disabled");
    }

    let addr = format!("0.0.0.0:{}", config.server_port);
    let state = AppState {
        store,
        notifier: Arc::new(notifier),
        config: Arc::new(config),
    };
    let app = app::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
