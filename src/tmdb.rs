use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{Config, DEFAULT_API_BASE, DEFAULT_IMAGE_BASE};
use crate::fallback::{fallback_movies, search_fallback};
use crate::models::{CastMember, Catalog, CatalogList, Movie, MovieDetails, MoviePage, Video};

pub const POSTER_SIZE: &str = "w500";
pub const BACKDROP_SIZE: &str = "w1280";
pub const POSTER_PLACEHOLDER: &str =
    "https://via.placeholder.com/500x750/1a1a1a/ffffff?text=Image+Not+Available";
pub const BACKDROP_PLACEHOLDER: &str =
    "https://via.placeholder.com/1280x720/1a1a1a/ffffff?text=Background+Not+Available";
const TOP_CAST: usize = 3;

/// Catalog boundary. List and search calls never fail: on any upstream error
/// they answer from the fallback dataset. Detail lookups return `Err` and the
/// caller degrades.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn list(&self, kind: CatalogList) -> Vec<Movie>;
    async fn search_movies(&self, query: &str) -> Vec<Movie>;
    async fn movie_details(&self, id: u64) -> Result<MovieDetails>;
    async fn movie_videos(&self, id: u64) -> Result<Vec<Video>>;

    async fn trending(&self) -> Vec<Movie> {
        self.list(CatalogList::Trending).await
    }

    async fn popular(&self) -> Vec<Movie> {
        self.list(CatalogList::Popular).await
    }

    async fn top_rated(&self) -> Vec<Movie> {
        self.list(CatalogList::TopRated).await
    }

    async fn now_playing(&self) -> Vec<Movie> {
        self.list(CatalogList::NowPlaying).await
    }

    async fn upcoming(&self) -> Vec<Movie> {
        self.list(CatalogList::Upcoming).await
    }

    async fn catalog(&self) -> Catalog {
        let (trending, popular, top_rated, now_playing, upcoming) = tokio::join!(
            self.trending(),
            self.popular(),
            self.top_rated(),
            self.now_playing(),
            self.upcoming(),
        );
        Catalog {
            trending,
            popular,
            top_rated,
            now_playing,
            upcoming,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn image_url(&self, path: Option<&str>, size: &str) -> String {
        match path.filter(|p| !p.is_empty()) {
            Some(p) => format!("{}/{size}{p}", self.base),
            None => POSTER_PLACEHOLDER.to_string(),
        }
    }

    pub fn backdrop_url(&self, path: Option<&str>, size: &str) -> String {
        match path.filter(|p| !p.is_empty()) {
            Some(p) => format!("{}/{size}{p}", self.base),
            None => BACKDROP_PLACEHOLDER.to_string(),
        }
    }

    pub fn poster(&self, movie: &Movie) -> String {
        self.image_url(movie.poster_path.as_deref(), POSTER_SIZE)
    }

    pub fn backdrop(&self, movie: &Movie) -> String {
        self.backdrop_url(movie.backdrop_path.as_deref(), BACKDROP_SIZE)
    }
}

impl Default for ImageUrls {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_BASE)
    }
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    token: String,
    api_base: String,
    images: ImageUrls,
}

impl TmdbClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.tmdb_token,
            &config.api_base,
            &config.image_base,
            config.request_timeout,
        )
    }

    pub fn new(token: &str, api_base: &str, image_base: &str, timeout: Duration) -> Result<Self> {
        let user_agent = format!("reelstream/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        let api_base = if api_base.is_empty() {
            DEFAULT_API_BASE
        } else {
            api_base
        };
        Ok(Self {
            client,
            token: token.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            images: ImageUrls::new(image_base),
        })
    }

    pub fn images(&self) -> &ImageUrls {
        &self.images
    }

    async fn fetch_page(&self, endpoint: &str) -> Result<MoviePage> {
        let separator = if endpoint.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{endpoint}{separator}language=en-US",
            self.api_base
        );
        self.get_json(&url).await
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {} {}", url, status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn list(&self, kind: CatalogList) -> Vec<Movie> {
        match self.fetch_page(kind.endpoint()).await {
            Ok(page) => {
                debug!("Fetched {} movies for {:?}", page.results.len(), kind);
                page.results
            }
            Err(e) => {
                warn!("TMDB {:?} unavailable, serving fallback catalog: {:#}", kind, e);
                fallback_movies()
            }
        }
    }

    async fn search_movies(&self, query: &str) -> Vec<Movie> {
        let endpoint = format!("/search/movie?query={}", urlencoding::encode(query));
        match self.fetch_page(&endpoint).await {
            Ok(page) => page.results,
            Err(e) => {
                warn!("TMDB search for '{}' failed, matching fallback: {:#}", query, e);
                search_fallback(query)
            }
        }
    }

    async fn movie_details(&self, id: u64) -> Result<MovieDetails> {
        let url = format!(
            "{}/movie/{id}?append_to_response=credits,videos&language=en-US",
            self.api_base
        );
        let detail: DetailResponse = self
            .get_json(&url)
            .await
            .with_context(|| format!("Fetching details for movie {id}"))?;
        Ok(detail.into_details())
    }

    async fn movie_videos(&self, id: u64) -> Result<Vec<Video>> {
        let url = format!("{}/movie/{id}/videos?language=en-US", self.api_base);
        let videos: Videos = self
            .get_json(&url)
            .await
            .with_context(|| format!("Fetching videos for movie {id}"))?;
        Ok(videos.results)
    }
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

#[derive(Debug, Deserialize, Default)]
struct Credits {
    #[serde(default)]
    cast: Vec<CastMember>,
    #[serde(default)]
    crew: Vec<CrewMember>,
}

#[derive(Debug, Deserialize)]
struct CrewMember {
    job: Option<String>,
    name: String,
}

#[derive(Debug, Deserialize, Default)]
struct Videos {
    #[serde(default)]
    results: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    runtime: Option<u32>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    credits: Credits,
    #[serde(default)]
    videos: Videos,
}

impl DetailResponse {
    fn into_details(self) -> MovieDetails {
        let director = self
            .credits
            .crew
            .iter()
            .find(|c| c.job.as_deref() == Some("Director"))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let trailer_key = select_trailer(&self.videos.results);
        MovieDetails {
            runtime: self.runtime.unwrap_or(0),
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            cast: self.credits.cast.into_iter().take(TOP_CAST).collect(),
            director,
            trailer_key,
        }
    }
}

/// YouTube trailer first, then a YouTube teaser, then anything on YouTube.
pub fn select_trailer(videos: &[Video]) -> Option<String> {
    let youtube = |v: &&Video| v.site.eq_ignore_ascii_case("YouTube");
    videos
        .iter()
        .filter(youtube)
        .find(|v| v.video_type == "Trailer")
        .or_else(|| videos.iter().filter(youtube).find(|v| v.video_type == "Teaser"))
        .or_else(|| videos.iter().find(youtube))
        .map(|v| v.key.clone())
}
