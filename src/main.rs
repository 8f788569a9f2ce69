use anyhow::Result;
use dotenvy::dotenv;
use reelstream::config::Config;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn check_env() -> Result<()> {
    let required = ["TMDB_ACCESS_TOKEN"];
    for key in required {
        if env::var(key).map_or(true, |v| v.trim().is_empty()) {
            anyhow::bail!("Missing required environment variable: {}", key);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_result = dotenv();
    init_tracing();
    match dotenv_result {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }
    check_env()?;
    let config = Config::from_env()?;
    info!(
        "TMDB at {} (timeout {:?}), images from {}",
        config.api_base, config.request_timeout, config.image_base
    );
    reelstream::app::run_server(config).await
}
