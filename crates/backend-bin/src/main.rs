//! Plenum meeting coordination server.

use std::sync::Arc;

use backend_lib::{config::Settings, ws_router, AppState};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    info!("starting Plenum server...");

    let settings = Settings::load().unwrap_or_else(|err| {
        warn!(%err, "failed to load configuration, using defaults");
        Settings::default()
    });
    info!(
        host = %settings.server.host,
        port = settings.server.port,
        max_rooms = settings.room.max_rooms,
        "configuration loaded"
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = Arc::new(AppState::new(settings));
    let app = ws_router::create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("server listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
