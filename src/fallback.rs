//! Fixed sample catalog served whenever TMDB cannot be reached.
use crate::models::Movie;
use chrono::NaiveDate;
use once_cell::sync::Lazy;

static FALLBACK_MOVIES: Lazy<Vec<Movie>> = Lazy::new(|| {
    vec![
        sample(
            1,
            "The Dark Knight",
            "When the menace known as the Joker wreaks havoc and chaos on the people of Gotham, Batman must accept one of the greatest psychological and physical tests of his ability to fight injustice.",
            (2008, 7, 18),
            9.0,
            &[28, 18, 80],
            1000.0,
            2500,
        ),
        sample(
            2,
            "Inception",
            "A thief who steals corporate secrets through the use of dream-sharing technology is given the inverse task of planting an idea into the mind of a C.E.O.",
            (2010, 7, 16),
            8.8,
            &[28, 878, 53],
            950.0,
            2100,
        ),
        sample(
            3,
            "Interstellar",
            "A team of explorers travel through a wormhole in space in an attempt to ensure humanity's survival.",
            (2014, 11, 7),
            8.6,
            &[18, 878],
            890.0,
            1900,
        ),
        sample(
            4,
            "Pulp Fiction",
            "The lives of two mob hitmen, a boxer, a gangster and his wife, and a pair of diner bandits intertwine in four tales of violence and redemption.",
            (1994, 10, 14),
            8.9,
            &[80, 18],
            820.0,
            1800,
        ),
        sample(
            5,
            "The Matrix",
            "A computer hacker learns from mysterious rebels about the true nature of his reality and his role in the war against its controllers.",
            (1999, 3, 31),
            8.7,
            &[28, 878],
            780.0,
            1700,
        ),
    ]
});

#[allow(clippy::too_many_arguments)]
fn sample(
    id: u64,
    title: &str,
    overview: &str,
    (year, month, day): (i32, u32, u32),
    vote_average: f64,
    genre_ids: &[u32],
    popularity: f64,
    vote_count: u64,
) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        overview: overview.to_string(),
        poster_path: Some(format!("/example{id}.jpg")),
        backdrop_path: Some(format!("/example{id}_backdrop.jpg")),
        release_date: NaiveDate::from_ymd_opt(year, month, day),
        vote_average,
        vote_count,
        genre_ids: genre_ids.to_vec(),
        popularity,
        adult: false,
        video: false,
        original_language: "en".to_string(),
        original_title: title.to_string(),
    }
}

pub fn fallback_movies() -> Vec<Movie> {
    FALLBACK_MOVIES.clone()
}

/// Case-insensitive substring match on title or overview.
pub fn search_fallback(query: &str) -> Vec<Movie> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    FALLBACK_MOVIES
        .iter()
        .filter(|m| {
            m.title.to_lowercase().contains(&needle) || m.overview.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
