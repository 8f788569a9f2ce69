//! Query TMDB through the catalog client and print the result as JSON.
//! Usage:
//!   cargo run --bin catalog_probe -- list <trending|popular|top_rated|now_playing|upcoming>
//!   cargo run --bin catalog_probe -- search <query>
//!   cargo run --bin catalog_probe -- details <tmdb_id>
//! Requires TMDB_ACCESS_TOKEN in the environment (.env supported).
//! Falls back to the built-in sample catalog when TMDB is unreachable, like the server.

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use reelstream::config::Config;
use reelstream::format::{format_rating, format_runtime, RatingTier};
use reelstream::models::CatalogList;
use reelstream::tmdb::{select_trailer, MovieCatalog, TmdbClient};
use serde_json::json;
use std::env;
use std::str::FromStr;

enum Probe {
    List(CatalogList),
    Search(String),
    Details(u64),
}

fn parse_list(name: &str) -> Result<CatalogList> {
    CatalogList::ALL
        .iter()
        .copied()
        .find(|kind| {
            serde_json::to_value(kind)
                .ok()
                .and_then(|v| v.as_str().map(|s| s == name))
                .unwrap_or(false)
        })
        .ok_or_else(|| anyhow!("unknown list '{}'", name))
}

impl FromStr for Probe {
    type Err = anyhow::Error;
    fn from_str(args: &str) -> Result<Self> {
        let (mode, rest) = args.split_once(' ').unwrap_or((args, ""));
        match mode.to_lowercase().as_str() {
            "list" => Ok(Probe::List(parse_list(rest.trim())?)),
            "search" if !rest.trim().is_empty() => Ok(Probe::Search(rest.trim().to_string())),
            "details" => Ok(Probe::Details(
                rest.trim().parse().context("tmdb_id must be an integer")?,
            )),
            _ => Err(anyhow!("mode must be 'list', 'search' or 'details'")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin catalog_probe -- list <name>");
        eprintln!("       cargo run --bin catalog_probe -- search <query>");
        eprintln!("       cargo run --bin catalog_probe -- details <tmdb_id>");
        std::process::exit(1);
    }

    let probe = Probe::from_str(&args.join(" "))?;
    let config = Config::from_env()?;
    let client = TmdbClient::from_config(&config)?;

    let output = match probe {
        Probe::List(kind) => {
            let movies = client.list(kind).await;
            json!({
                "list": kind.row_title(),
                "count": movies.len(),
                "movies": movies.iter().map(|m| json!({
                    "id": m.id,
                    "title": m.title,
                    "rating": format_rating(m.vote_average),
                    "tier": RatingTier::classify(m.vote_average).as_str(),
                    "poster": client.images().poster(m),
                })).collect::<Vec<_>>(),
            })
        }
        Probe::Search(query) => {
            let movies = client.search_movies(&query).await;
            json!({ "query": query, "results": movies })
        }
        Probe::Details(id) => {
            let details = client.movie_details(id).await?;
            let videos = client.movie_videos(id).await?;
            json!({
                "id": id,
                "runtime": format_runtime(details.runtime),
                "details": details,
                "videos": videos.len(),
                "trailer_key": select_trailer(&videos),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
