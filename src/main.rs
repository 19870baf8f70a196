use livemetrics::application::system::Application;
use livemetrics::config::Config;

use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    info!("Initializing Livemetrics backend...");

    let config = Config::from_env()?;
    let app = Application::build(config).await?;
    let handle = app.start();

    info!("Livemetrics running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C signal.");
    handle.shutdown().await;

    Ok(())
}
