// Web Server Binary Entry Point
//
// Usage: cargo run --bin web_server
// Configuration comes from the environment, see `Config::from_env`.

use blaseball_reference::{create_router, AppState, Config};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blaseball_reference=info,tower_http=debug,axum=debug,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting web server...");

    let config = Config::from_env();
    config.log_summary();

    let port = config.port;
    let state = AppState::new(config).await?;
    tracing::info!("Application state initialized");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
