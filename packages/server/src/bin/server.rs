//! Server entry point, grounded on the teacher's `server/main.rs`
//! (`tracing_subscriber` registry init, `Config::from_env`, `axum::serve`).

use anyhow::{Context, Result};
use server_core::app::build_app;
use server_core::config::Config;
use server_core::state::AppState;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,server_core=debug,ragcore=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(port = config.port, "configuration loaded");

    let port = config.port;
    let state = AppState::wire_default(config);
    let app = build_app(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(%addr, "starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await.context("failed to bind to address")?;
    axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>())
        .await
        .context("server error")?;

    Ok(())
}
