use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, with = "release_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub video: bool,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub original_title: String,
}

/// Paged envelope used by every TMDB list endpoint.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MoviePage {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MovieDetails {
    pub runtime: u32,
    pub genres: Vec<String>,
    pub cast: Vec<CastMember>,
    pub director: String,
    pub trailer_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Video {
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SearchResponse {
    pub results: Vec<Movie>,
}

/// The five catalog lists rendered as rows on the browse page.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Catalog {
    pub trending: Vec<Movie>,
    pub popular: Vec<Movie>,
    pub top_rated: Vec<Movie>,
    pub now_playing: Vec<Movie>,
    pub upcoming: Vec<Movie>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CatalogList {
    Trending,
    Popular,
    TopRated,
    NowPlaying,
    Upcoming,
}

impl CatalogList {
    pub const ALL: [CatalogList; 5] = [
        CatalogList::Trending,
        CatalogList::Popular,
        CatalogList::TopRated,
        CatalogList::NowPlaying,
        CatalogList::Upcoming,
    ];

    pub fn endpoint(&self) -> &'static str {
        match self {
            CatalogList::Trending => "/trending/movie/week",
            CatalogList::Popular => "/movie/popular",
            CatalogList::TopRated => "/movie/top_rated",
            CatalogList::NowPlaying => "/movie/now_playing",
            CatalogList::Upcoming => "/movie/upcoming",
        }
    }

    pub fn row_title(&self) -> &'static str {
        match self {
            CatalogList::Trending => "Trending Now",
            CatalogList::Popular => "Popular",
            CatalogList::TopRated => "Top Rated",
            CatalogList::NowPlaying => "Now Playing",
            CatalogList::Upcoming => "Coming Soon",
        }
    }
}

impl Catalog {
    pub fn list(&self, kind: CatalogList) -> &[Movie] {
        match kind {
            CatalogList::Trending => &self.trending,
            CatalogList::Popular => &self.popular,
            CatalogList::TopRated => &self.top_rated,
            CatalogList::NowPlaying => &self.now_playing,
            CatalogList::Upcoming => &self.upcoming,
        }
    }

    pub fn set_list(&mut self, kind: CatalogList, movies: Vec<Movie>) {
        match kind {
            CatalogList::Trending => self.trending = movies,
            CatalogList::Popular => self.popular = movies,
            CatalogList::TopRated => self.top_rated = movies,
            CatalogList::NowPlaying => self.now_playing = movies,
            CatalogList::Upcoming => self.upcoming = movies,
        }
    }

    /// Featured movie: first trending entry, else the first movie of any list.
    pub fn hero(&self) -> Option<&Movie> {
        CatalogList::ALL
            .iter()
            .find_map(|kind| self.list(*kind).first())
    }
}

/// TMDB sends `""` for unknown dates; those (and anything unparseable) read as `None`.
mod release_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
    }
}
