use std::net::SocketAddr;

use anyhow::Context;
use tracing::{Level, info};

use image_store::config::AppConfig;
use image_store::database::init_db;
use image_store::images::run_orphan_collector;
use image_store::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let gc = config.gc.clone();

    let state = AppState::new(db, config);

    if gc.enabled {
        tokio::spawn(run_orphan_collector(
            state.db.clone(),
            state.blob_store.clone(),
            gc,
        ));
    } else {
        info!("Orphan collector disabled");
    }

    let app = image_store::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
