use anyhow::Result;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use tracing::{debug, warn};

use super::keys::{Key, KeyEvent, KeyResponse};
use super::listeners::{ListenerKind, Subscription, WindowListeners};
use super::{Effect, RequestToken, TokenSource};
use crate::format::{
    format_rating, format_runtime, match_percentage, maturity_label, mood_line, release_year,
    youtube_embed_url, RatingTier,
};
use crate::models::{Movie, MovieDetails};
use crate::tmdb::ImageUrls;

#[derive(Debug, Clone, PartialEq)]
pub enum DetailsState {
    Loading { token: RequestToken },
    Loaded(MovieDetails),
    Failed,
}

#[derive(Debug)]
pub struct OpenModal {
    pub movie: Movie,
    pub details: DetailsState,
    pub muted: bool,
    pub match_percentage: u8,
    _keys: Subscription,
}

/// Details overlay. Being `Open` is the only way to have a selection, so
/// "visible iff selected and open" holds by construction.
pub struct DetailsModal {
    state: Option<OpenModal>,
    tokens: TokenSource,
    rng: Box<dyn RngCore + Send>,
    listeners: WindowListeners,
}

impl std::fmt::Debug for DetailsModal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailsModal")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl DetailsModal {
    pub fn new(listeners: WindowListeners) -> Self {
        Self::with_rng(listeners, Box::new(StdRng::from_entropy()))
    }

    pub fn with_rng(listeners: WindowListeners, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            state: None,
            tokens: TokenSource::default(),
            rng,
            listeners,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    pub fn current(&self) -> Option<&OpenModal> {
        self.state.as_ref()
    }

    pub fn selected(&self) -> Option<&Movie> {
        self.state.as_ref().map(|s| &s.movie)
    }

    /// Opening for the movie already shown is a re-render and fetches nothing.
    pub fn open(&mut self, movie: Movie) -> Option<Effect> {
        if self.selected().map(|m| m.id) == Some(movie.id) {
            return None;
        }
        let token = self.tokens.next();
        let movie_id = movie.id;
        // Reuse the keyboard subscription when switching movies.
        let keys = match self.state.take() {
            Some(previous) => previous._keys,
            None => self.listeners.subscribe(ListenerKind::KeyDown, "details-modal"),
        };
        self.state = Some(OpenModal {
            movie,
            details: DetailsState::Loading { token },
            muted: true,
            match_percentage: match_percentage(&mut *self.rng),
            _keys: keys,
        });
        Some(Effect::FetchDetails { token, movie_id })
    }

    pub fn close(&mut self) {
        self.state = None;
    }

    /// Applies a details response only if it answers the current open for the
    /// current movie; anything else is stale.
    pub fn details_resolved(
        &mut self,
        token: RequestToken,
        movie_id: u64,
        result: Result<MovieDetails>,
    ) -> bool {
        let Some(open) = self.state.as_mut() else {
            debug!("Discarding details for movie {}: modal closed", movie_id);
            return false;
        };
        let current = matches!(open.details, DetailsState::Loading { token: t } if t == token);
        if !current || open.movie.id != movie_id {
            debug!("Discarding stale details for movie {}", movie_id);
            return false;
        }
        open.details = match result {
            Ok(details) => DetailsState::Loaded(details),
            Err(e) => {
                warn!("Details lookup failed for movie {}: {:#}", movie_id, e);
                DetailsState::Failed
            }
        };
        true
    }

    pub fn toggle_mute(&mut self) {
        if let Some(open) = self.state.as_mut() {
            open.muted = !open.muted;
        }
    }

    pub fn handle_key(&mut self, event: KeyEvent) -> KeyResponse {
        if !self.is_open() {
            return KeyResponse::ignored();
        }
        match event.key {
            Key::Escape => {
                self.close();
                KeyResponse::handled()
            }
            Key::Space => {
                self.toggle_mute();
                KeyResponse::consumed()
            }
            Key::Char('m') | Key::Char('M') => {
                self.toggle_mute();
                KeyResponse::handled()
            }
            _ => KeyResponse::ignored(),
        }
    }

    pub fn view(&self, images: &ImageUrls) -> Option<ModalView> {
        self.state.as_ref().map(|open| ModalView::new(open, images))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalView {
    pub movie_id: u64,
    pub title: String,
    pub overview: String,
    pub rating: String,
    pub tier: RatingTier,
    pub tier_label: &'static str,
    pub match_percentage: u8,
    pub year: Option<i32>,
    pub maturity: &'static str,
    pub runtime: Option<String>,
    pub cast: Option<String>,
    pub genres: Option<String>,
    pub director: Option<String>,
    pub mood: &'static str,
    pub loading: bool,
    pub muted: bool,
    /// Embedded player when a trailer is known.
    pub trailer_url: Option<String>,
    /// Shown instead of the player when there is no trailer.
    pub backdrop_url: String,
}

impl ModalView {
    fn new(open: &OpenModal, images: &ImageUrls) -> Self {
        let movie = &open.movie;
        let details = match &open.details {
            DetailsState::Loaded(d) => Some(d),
            _ => None,
        };
        let tier = RatingTier::classify(movie.vote_average);
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            overview: movie.overview.clone(),
            rating: format_rating(movie.vote_average),
            tier,
            tier_label: tier.label(),
            match_percentage: open.match_percentage,
            year: release_year(movie.release_date),
            maturity: maturity_label(movie.vote_average),
            runtime: details
                .filter(|d| d.runtime > 0)
                .map(|d| format_runtime(d.runtime)),
            cast: details
                .filter(|d| !d.cast.is_empty())
                .map(|d| d.cast.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")),
            genres: details
                .filter(|d| !d.genres.is_empty())
                .map(|d| d.genres.join(", ")),
            director: details.map(|d| d.director.clone()),
            mood: mood_line(movie.vote_average),
            loading: matches!(open.details, DetailsState::Loading { .. }),
            muted: open.muted,
            trailer_url: details
                .and_then(|d| d.trailer_key.as_deref())
                .map(|key| youtube_embed_url(key, open.muted)),
            backdrop_url: images.backdrop(movie),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::fallback_movies;
    use crate::format::{MATCH_MAX, MATCH_MIN};
    use crate::models::CastMember;
    use anyhow::anyhow;

    fn movie(id: u64) -> Movie {
        fallback_movies()
            .into_iter()
            .find(|m| m.id == id)
            .expect("fallback movie")
    }

    fn details(runtime: u32, trailer: Option<&str>) -> MovieDetails {
        MovieDetails {
            runtime,
            genres: vec!["Action".to_string(), "Crime".to_string()],
            cast: vec![
                CastMember {
                    name: "Christian Bale".to_string(),
                    character: "Bruce Wayne".to_string(),
                },
                CastMember {
                    name: "Heath Ledger".to_string(),
                    character: "Joker".to_string(),
                },
            ],
            director: "Christopher Nolan".to_string(),
            trailer_key: trailer.map(str::to_string),
        }
    }

    fn modal() -> (DetailsModal, WindowListeners) {
        let listeners = WindowListeners::new();
        let modal =
            DetailsModal::with_rng(listeners.clone(), Box::new(StdRng::seed_from_u64(11)));
        (modal, listeners)
    }

    fn token_of(effect: Option<Effect>) -> RequestToken {
        match effect {
            Some(Effect::FetchDetails { token, .. }) => token,
            other => panic!("expected details fetch, got {other:?}"),
        }
    }

    #[test]
    fn open_fetches_once_per_open() {
        let (mut modal, _) = modal();
        let first = modal.open(movie(1));
        assert!(matches!(first, Some(Effect::FetchDetails { movie_id: 1, .. })));
        assert_eq!(modal.open(movie(1)), None);
        modal.close();
        assert!(modal.open(movie(1)).is_some());
    }

    #[test]
    fn stale_details_for_previous_selection_are_discarded() {
        let (mut modal, _) = modal();
        let stale = token_of(modal.open(movie(2)));
        let fresh = token_of(modal.open(movie(1)));

        assert!(!modal.details_resolved(stale, 2, Ok(details(148, Some("inception")))));
        let open = modal.current().expect("open");
        assert_eq!(open.movie.id, 1);
        assert_eq!(open.details, DetailsState::Loading { token: fresh });

        assert!(modal.details_resolved(fresh, 1, Ok(details(152, Some("dark-knight")))));
        assert!(matches!(
            modal.current().map(|o| &o.details),
            Some(DetailsState::Loaded(d)) if d.runtime == 152
        ));
    }

    #[test]
    fn details_after_close_are_dropped() {
        let (mut modal, _) = modal();
        let token = token_of(modal.open(movie(3)));
        modal.close();
        assert!(!modal.details_resolved(token, 3, Ok(details(169, None))));
        assert!(!modal.is_open());
    }

    #[test]
    fn failed_fetch_degrades_to_failed_state() {
        let (mut modal, _) = modal();
        let token = token_of(modal.open(movie(4)));
        assert!(modal.details_resolved(token, 4, Err(anyhow!("HTTP 500"))));
        let view = modal.view(&ImageUrls::default()).expect("view");
        assert!(!view.loading);
        assert_eq!(view.trailer_url, None);
        assert_eq!(view.runtime, None);
        assert_eq!(
            view.backdrop_url,
            "https://image.tmdb.org/t/p/w1280/example4_backdrop.jpg"
        );
    }

    #[test]
    fn keys_close_and_toggle_mute() {
        let (mut modal, listeners) = modal();
        modal.open(movie(1));
        assert_eq!(listeners.count(ListenerKind::KeyDown), 1);
        assert!(modal.current().unwrap().muted);

        let space = modal.handle_key(KeyEvent::new(Key::Space));
        assert!(space.prevent_default);
        assert!(!modal.current().unwrap().muted);

        let m = modal.handle_key(KeyEvent::new(Key::Char('M')));
        assert!(m.handled);
        assert!(modal.current().unwrap().muted);

        assert!(!modal.handle_key(KeyEvent::new(Key::Left)).handled);

        modal.handle_key(KeyEvent::new(Key::Escape));
        assert!(!modal.is_open());
        assert_eq!(listeners.count(ListenerKind::KeyDown), 0);
        assert!(!modal.handle_key(KeyEvent::new(Key::Escape)).handled);
    }

    #[test]
    fn switching_movies_keeps_one_key_listener() {
        let (mut modal, listeners) = modal();
        for id in 1..=5 {
            modal.open(movie(id));
            assert_eq!(listeners.count(ListenerKind::KeyDown), 1);
        }
    }

    #[test]
    fn view_formats_loaded_details() {
        let (mut modal, _) = modal();
        let token = token_of(modal.open(movie(1)));
        modal.details_resolved(token, 1, Ok(details(152, Some("EXeTwQWrcwY"))));
        let view = modal.view(&ImageUrls::default()).expect("view");
        assert_eq!(view.runtime.as_deref(), Some("2h 32m"));
        assert_eq!(view.maturity, "13+");
        assert_eq!(view.tier_label, "Excellent Rating");
        assert_eq!(view.cast.as_deref(), Some("Christian Bale, Heath Ledger"));
        assert_eq!(view.genres.as_deref(), Some("Action, Crime"));
        assert_eq!(view.director.as_deref(), Some("Christopher Nolan"));
        assert_eq!(view.mood, "Exciting, Thrilling");
        assert!((MATCH_MIN..=MATCH_MAX).contains(&view.match_percentage));
        assert_eq!(
            view.trailer_url.as_deref(),
            Some("https://www.youtube.com/embed/EXeTwQWrcwY?autoplay=1&mute=1&controls=1&rel=0&modestbranding=1")
        );
    }
}
