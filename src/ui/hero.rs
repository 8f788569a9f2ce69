use serde::Serialize;

use crate::format::{format_rating, release_year, truncate_text, RatingTier};
use crate::models::Movie;
use crate::tmdb::ImageUrls;

const OVERVIEW_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroBanner {
    pub movie_id: u64,
    pub title: String,
    pub overview: String,
    pub backdrop_url: String,
    pub rating: String,
    pub tier: RatingTier,
    pub year: Option<i32>,
}

impl HeroBanner {
    pub fn new(movie: &Movie, images: &ImageUrls) -> Self {
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            overview: truncate_text(&movie.overview, OVERVIEW_LIMIT),
            backdrop_url: images.backdrop(movie),
            rating: format_rating(movie.vote_average),
            tier: RatingTier::classify(movie.vote_average),
            year: release_year(movie.release_date),
        }
    }
}
