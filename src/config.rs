use anyhow::{bail, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4321";
const DEFAULT_STATIC_DIR: &str = "dist";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_token: String,
    pub api_base: String,
    pub image_base: String,
    pub request_timeout: Duration,
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let tmdb_token = env::var("TMDB_ACCESS_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("TMDB_ACCESS_TOKEN not set")?;

        let api_base = var_or("TMDB_API_BASE", DEFAULT_API_BASE);
        let image_base = var_or("TMDB_IMAGE_BASE", DEFAULT_IMAGE_BASE);
        let request_timeout = parse_timeout(env::var("TMDB_TIMEOUT_SECS").ok())?;
        let bind_raw = var_or("BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .with_context(|| format!("BIND_ADDR is not a socket address: {bind_raw}"))?;
        let static_dir = PathBuf::from(var_or("STATIC_DIR", DEFAULT_STATIC_DIR));

        Ok(Self {
            tmdb_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            image_base: image_base.trim_end_matches('/').to_string(),
            request_timeout,
            bind_addr,
            static_dir,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Request timeout in whole seconds; zero is refused.
fn parse_timeout(raw: Option<String>) -> Result<Duration> {
    let secs = match raw.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_TIMEOUT_SECS,
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("TMDB_TIMEOUT_SECS is not a number: {raw}"))?,
    };
    if secs == 0 {
        bail!("TMDB_TIMEOUT_SECS must be at least 1");
    }
    Ok(Duration::from_secs(secs))
}
