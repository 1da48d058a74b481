//! # FeedHub API Server
//!
//! HTTP server for FeedHub: account management, media upload to a remote
//! object store, a global feed, and owner-only post deletion.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (`.env` honored)
//! 2. Connect the database pool and apply embedded migrations
//! 3. Build the ImageKit client
//! 4. Serve until Ctrl-C, then drain and close the pool
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p feedhub-api
//! ```

use feedhub_api::{
    app::{build_router, AppState},
    config::Config,
};
use feedhub_shared::{
    db::{migrations::run_migrations, pool},
    storage::ImageKitClient,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG and LOG_FORMAT may come from .env
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "FeedHub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(config.pool_config()).await?;
    run_migrations(&db).await?;

    let store = Arc::new(ImageKitClient::new(config.imagekit_config())?);

    if let Some(dir) = &config.storage.tmp_dir {
        tokio::fs::create_dir_all(dir).await?;
    }

    let bind_address = config.bind_address();
    let state = AppState::new(db.clone(), config, store);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(db).await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Human-readable output by default, JSON lines with `LOG_FORMAT=json`
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "feedhub_api=debug,feedhub_shared=debug,tower_http=debug".into()
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
