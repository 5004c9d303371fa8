use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use inkpost::config::{Cli, Config};
use inkpost::routes;
use inkpost::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config; missing secrets abort startup here
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!(
        "Allowed origins: {}",
        config.server.allowed_origins.join(", ")
    );

    let state = AppState::from_config(config)?;
    tracing::info!("Database is connected");

    let app = routes::router(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
