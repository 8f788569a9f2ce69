use crate::config::Config;
use crate::models::{Catalog, Movie, SearchResponse, Video};
use crate::tmdb::{select_trailer, ImageUrls, MovieCatalog, TmdbClient};
use crate::ui::hero::HeroBanner;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{path::PathBuf, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn MovieCatalog>,
    pub images: ImageUrls,
}

pub async fn run_server(config: Config) -> Result<()> {
    let client = TmdbClient::from_config(&config)?;
    let state = AppState {
        images: client.images().clone(),
        catalog: Arc::new(client),
    };

    let static_dir = if config.static_dir.is_dir() {
        info!("Serving static files from {}", config.static_dir.display());
        Some(config.static_dir.clone())
    } else {
        warn!(
            "Static directory {} not found, serving API only",
            config.static_dir.display()
        );
        None
    };

    let app = build_router(state, static_dir);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Binding {}", config.bind_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let mut router = Router::new()
        .route("/api/search", get(search))
        .route("/api/catalog", get(catalog))
        .route("/api/movies/:id", get(movie_details))
        .route("/api/movies/:id/videos", get(movie_videos))
        .route("/health", get(health))
        .with_state(state);
    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }
    router.layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

/// Always 200; upstream trouble is absorbed by the catalog's fallback.
async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let query = params.q.as_deref().unwrap_or_default();
    if query.trim().is_empty() {
        return Json(SearchResponse::default());
    }
    let results = state.catalog.search_movies(query).await;
    debug!("Search '{}' -> {} results", query, results.len());
    Json(SearchResponse { results })
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    #[serde(flatten)]
    catalog: Catalog,
    hero: Option<Movie>,
    hero_banner: Option<HeroBanner>,
}

async fn catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let catalog = state.catalog.catalog().await;
    let hero = catalog.hero().cloned();
    let hero_banner = hero.as_ref().map(|m| HeroBanner::new(m, &state.images));
    Json(CatalogResponse {
        catalog,
        hero,
        hero_banner,
    })
}

async fn movie_details(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.catalog.movie_details(id).await {
        Ok(details) => Json(details).into_response(),
        Err(e) => upstream_error(id, e),
    }
}

#[derive(Debug, Serialize)]
struct VideosResponse {
    results: Vec<Video>,
    trailer_key: Option<String>,
}

async fn movie_videos(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.catalog.movie_videos(id).await {
        Ok(results) => {
            let trailer_key = select_trailer(&results);
            Json(VideosResponse {
                results,
                trailer_key,
            })
            .into_response()
        }
        Err(e) => upstream_error(id, e),
    }
}

fn upstream_error(id: u64, e: anyhow::Error) -> Response {
    warn!("Upstream lookup for movie {} failed: {:#}", id, e);
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": format!("{:#}", e) })),
    )
        .into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
