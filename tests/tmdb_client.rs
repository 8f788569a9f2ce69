use axum::extract::{Path, Query};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use reelstream::config::DEFAULT_IMAGE_BASE;
use reelstream::models::CatalogList;
use reelstream::tmdb::{MovieCatalog, TmdbClient};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const TOKEN: &str = "test-read-token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {TOKEN}").as_str())
}

fn movie(id: u64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "overview": format!("{title} overview"),
        "poster_path": format!("/poster{id}.jpg"),
        "backdrop_path": null,
        "release_date": "2023-05-05",
        "vote_average": 7.1,
        "vote_count": 420,
        "genre_ids": [12, 16],
        "popularity": 55.5,
        "adult": false,
        "video": false,
        "original_language": "en",
        "original_title": title
    })
}

fn page(results: Vec<Value>) -> Value {
    let total = results.len();
    json!({ "page": 1, "results": results, "total_pages": 1, "total_results": total })
}

async fn popular(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    assert_eq!(q.get("language").map(String::as_str), Some("en-US"));
    Json(page(vec![movie(101, "Upstream One"), movie(102, "Upstream Two")])).into_response()
}

async fn search(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let query = q.get("query").cloned().unwrap_or_default();
    Json(page(vec![movie(200, &format!("Echo: {query}"))])).into_response()
}

async fn details(
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "status_message": "The resource you requested could not be found." })),
        )
            .into_response();
    }
    assert_eq!(
        q.get("append_to_response").map(String::as_str),
        Some("credits,videos")
    );
    Json(json!({
        "id": id,
        "runtime": 169,
        "genres": [{ "id": 12, "name": "Adventure" }, { "id": 18, "name": "Drama" }],
        "credits": {
            "cast": [
                { "name": "Matthew McConaughey", "character": "Cooper" },
                { "name": "Anne Hathaway", "character": "Brand" },
                { "name": "Jessica Chastain", "character": "Murph" },
                { "name": "Michael Caine", "character": "Professor Brand" }
            ],
            "crew": [
                { "name": "Hans Zimmer", "job": "Original Music Composer" },
                { "name": "Christopher Nolan", "job": "Director" }
            ]
        },
        "videos": {
            "results": [
                { "key": "vimeo1", "name": "Clip", "site": "Vimeo", "type": "Trailer" },
                { "key": "zSWdZVtXT7E", "name": "Official Trailer", "site": "YouTube", "type": "Trailer" }
            ]
        }
    }))
    .into_response()
}

async fn videos(headers: HeaderMap, Path(id): Path<u64>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "id": id,
        "results": [
            { "key": "teaser1", "name": "Teaser", "site": "YouTube", "type": "Teaser" }
        ]
    }))
    .into_response()
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_fake_tmdb() -> String {
    let app = Router::new()
        .route("/movie/popular", get(popular))
        .route("/trending/movie/week", get(broken))
        .route("/search/movie", get(search))
        .route("/movie/:id", get(details))
        .route("/movie/:id/videos", get(videos));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str, token: &str) -> TmdbClient {
    TmdbClient::new(token, base, DEFAULT_IMAGE_BASE, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn list_parses_upstream_page() {
    let base = spawn_fake_tmdb().await;
    let movies = client(&base, TOKEN).popular().await;
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0].id, 101);
    assert_eq!(movies[0].genre_ids, vec![12, 16]);
    assert_eq!(movies[1].backdrop_path, None);
    assert_eq!(
        movies[0].release_date.map(|d| d.to_string()).as_deref(),
        Some("2023-05-05")
    );
}

#[tokio::test]
async fn failing_list_serves_fallback() {
    let base = spawn_fake_tmdb().await;
    let movies = client(&base, TOKEN).list(CatalogList::Trending).await;
    let titles: Vec<_> = movies.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "The Dark Knight",
            "Inception",
            "Interstellar",
            "Pulp Fiction",
            "The Matrix"
        ]
    );
}

#[tokio::test]
async fn rejected_token_serves_fallback() {
    let base = spawn_fake_tmdb().await;
    let movies = client(&base, "wrong-token").popular().await;
    assert_eq!(movies.len(), 5);
    assert_eq!(movies[0].title, "The Dark Knight");
}

#[tokio::test]
async fn catalog_mixes_live_and_fallback_lists() {
    let base = spawn_fake_tmdb().await;
    let catalog = client(&base, TOKEN).catalog().await;
    assert_eq!(catalog.popular.len(), 2);
    assert_eq!(catalog.trending.len(), 5);
    // The fake server rejects the remaining list endpoints.
    assert_eq!(catalog.upcoming[0].id, 1);
    assert_eq!(catalog.hero().map(|m| m.id), Some(1));
}

#[tokio::test]
async fn search_sends_encoded_query() {
    let base = spawn_fake_tmdb().await;
    let results = client(&base, TOKEN).search_movies("star wars & co").await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Echo: star wars & co");
}

#[tokio::test]
async fn unreachable_upstream_search_matches_fallback() {
    let results = client("http://127.0.0.1:1", TOKEN)
        .search_movies("batman")
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "The Dark Knight");

    let none = client("http://127.0.0.1:1", TOKEN)
        .search_movies("zzzz-no-such-film")
        .await;
    assert!(none.is_empty());
}

#[tokio::test]
async fn details_map_credits_and_trailer() {
    let base = spawn_fake_tmdb().await;
    let details = client(&base, TOKEN).movie_details(157336).await.unwrap();
    assert_eq!(details.runtime, 169);
    assert_eq!(details.genres, vec!["Adventure", "Drama"]);
    assert_eq!(details.director, "Christopher Nolan");
    let cast: Vec<_> = details.cast.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        cast,
        vec!["Matthew McConaughey", "Anne Hathaway", "Jessica Chastain"]
    );
    assert_eq!(details.trailer_key.as_deref(), Some("zSWdZVtXT7E"));
}

#[tokio::test]
async fn details_error_is_returned_not_masked() {
    let base = spawn_fake_tmdb().await;
    let err = client(&base, TOKEN).movie_details(404).await.unwrap_err();
    assert!(format!("{err:#}").contains("404"));
}

#[tokio::test]
async fn videos_are_listed() {
    let base = spawn_fake_tmdb().await;
    let videos = client(&base, TOKEN).movie_videos(27205).await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].video_type, "Teaser");
}
