use anyhow::Result;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{CardId, Effect, RequestToken, TokenSource};
use crate::format::{format_rating, release_year, youtube_embed_url, RatingTier};
use crate::models::{Movie, Video};
use crate::tmdb::{select_trailer, ImageUrls};

/// Sustained hover needed before a card swaps its poster for the trailer.
pub const HOVER_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Idle,
    Pending { due: Instant },
    /// Video list requested; `muted` carries a toggle made before it arrives.
    Resolving { token: RequestToken, muted: bool },
    Playing { key: String },
    PlayingMuted { key: String },
    Unavailable,
}

/// Per-card hover preview. Exactly one pending deadline at a time; leaving the
/// card drops it and invalidates any outstanding video request.
///
/// Video tokens come from a source owned by whoever holds the previews, so a
/// preview rebuilt for the same card never reuses a token still in flight.
#[derive(Debug)]
pub struct CardPreview {
    card: CardId,
    preview: Preview,
}

impl CardPreview {
    pub fn new(card: CardId) -> Self {
        Self {
            card,
            preview: Preview::Idle,
        }
    }

    pub fn card(&self) -> CardId {
        self.card
    }

    pub fn state(&self) -> &Preview {
        &self.preview
    }

    pub fn hover_enter(&mut self, now: Instant) {
        if self.preview == Preview::Idle {
            self.preview = Preview::Pending {
                due: now + HOVER_DELAY,
            };
        }
    }

    pub fn hover_exit(&mut self) {
        self.preview = Preview::Idle;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.preview {
            Preview::Pending { due } => Some(due),
            _ => None,
        }
    }

    pub fn poll(&mut self, now: Instant, tokens: &mut TokenSource) -> Option<Effect> {
        match self.preview {
            Preview::Pending { due } if now >= due => {
                let token = tokens.next();
                self.preview = Preview::Resolving { token, muted: true };
                Some(Effect::FetchVideos {
                    card: self.card,
                    token,
                    movie_id: self.card.movie_id,
                })
            }
            _ => None,
        }
    }

    /// Returns false when the response belongs to an abandoned hover.
    pub fn videos_resolved(&mut self, token: RequestToken, result: Result<Vec<Video>>) -> bool {
        let muted = match self.preview {
            Preview::Resolving { token: current, muted } if current == token => muted,
            _ => {
                debug!("Discarding stale video list for card {:?}", self.card);
                return false;
            }
        };
        self.preview = match result.map(|videos| select_trailer(&videos)) {
            Ok(Some(key)) if muted => Preview::PlayingMuted { key },
            Ok(Some(key)) => Preview::Playing { key },
            Ok(None) => Preview::Unavailable,
            Err(e) => {
                warn!("Video lookup failed for movie {}: {:#}", self.card.movie_id, e);
                Preview::Unavailable
            }
        };
        true
    }

    pub fn toggle_mute(&mut self) {
        self.preview = match std::mem::replace(&mut self.preview, Preview::Idle) {
            Preview::Playing { key } => Preview::PlayingMuted { key },
            Preview::PlayingMuted { key } => Preview::Playing { key },
            Preview::Resolving { token, muted } => Preview::Resolving {
                token,
                muted: !muted,
            },
            other => other,
        };
    }

    pub fn is_playing(&self) -> bool {
        matches!(
            self.preview,
            Preview::Resolving { .. } | Preview::Playing { .. } | Preview::PlayingMuted { .. }
        )
    }

    pub fn is_muted(&self) -> bool {
        match self.preview {
            Preview::Playing { .. } => false,
            Preview::Resolving { muted, .. } => muted,
            _ => true,
        }
    }

    pub fn embed_url(&self) -> Option<String> {
        match &self.preview {
            Preview::Playing { key } => Some(youtube_embed_url(key, false)),
            Preview::PlayingMuted { key } => Some(youtube_embed_url(key, true)),
            _ => None,
        }
    }
}

/// Poster tile contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub movie_id: u64,
    pub title: String,
    pub poster_url: String,
    pub rating: String,
    pub tier: RatingTier,
    pub year: Option<i32>,
    pub overview: String,
}

impl CardView {
    pub fn new(movie: &Movie, images: &ImageUrls) -> Self {
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            poster_url: images.poster(movie),
            rating: format_rating(movie.vote_average),
            tier: RatingTier::classify(movie.vote_average),
            year: release_year(movie.release_date),
            overview: movie.overview.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    const CARD: CardId = CardId {
        row: 0,
        movie_id: 550,
    };

    fn trailer(key: &str) -> Video {
        Video {
            key: key.to_string(),
            name: "Official Trailer".to_string(),
            site: "YouTube".to_string(),
            video_type: "Trailer".to_string(),
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn exit_before_delay_never_plays() {
        let t0 = Instant::now();
        let mut card = CardPreview::new(CARD);
        let mut tokens = TokenSource::default();
        card.hover_enter(t0);
        assert_eq!(card.poll(t0 + ms(799), &mut tokens), None);
        card.hover_exit();
        assert_eq!(card.poll(t0 + ms(801), &mut tokens), None);
        assert!(!card.is_playing());
        assert_eq!(card.state(), &Preview::Idle);
        assert_eq!(card.next_deadline(), None);
    }

    #[test]
    fn sustained_hover_issues_one_video_request() {
        let t0 = Instant::now();
        let mut card = CardPreview::new(CARD);
        let mut tokens = TokenSource::default();
        card.hover_enter(t0);
        let effect = card.poll(t0 + HOVER_DELAY, &mut tokens);
        assert!(matches!(
            effect,
            Some(Effect::FetchVideos { movie_id: 550, .. })
        ));
        assert!(card.is_playing());
        assert_eq!(card.poll(t0 + ms(5000), &mut tokens), None);
    }

    #[test]
    fn reentering_while_pending_keeps_single_deadline() {
        let t0 = Instant::now();
        let mut card = CardPreview::new(CARD);
        let mut tokens = TokenSource::default();
        card.hover_enter(t0);
        card.hover_enter(t0 + ms(400));
        assert_eq!(card.next_deadline(), Some(t0 + HOVER_DELAY));
        assert!(card.poll(t0 + HOVER_DELAY, &mut tokens).is_some());
        assert!(card.poll(t0 + ms(1200), &mut tokens).is_none());
    }

    #[test]
    fn resolves_to_muted_player_by_default() {
        let t0 = Instant::now();
        let mut card = CardPreview::new(CARD);
        let mut tokens = TokenSource::default();
        card.hover_enter(t0);
        let Some(Effect::FetchVideos { token, .. }) = card.poll(t0 + HOVER_DELAY, &mut tokens) else {
            panic!("expected video request");
        };
        assert!(card.videos_resolved(token, Ok(vec![trailer("k1")])));
        assert_eq!(
            card.state(),
            &Preview::PlayingMuted {
                key: "k1".to_string()
            }
        );
        assert!(card.is_muted());
        assert!(card.embed_url().unwrap().contains("mute=1"));

        card.toggle_mute();
        assert_eq!(card.state(), &Preview::Playing { key: "k1".to_string() });
        assert!(card.embed_url().unwrap().contains("mute=0"));
    }

    #[test]
    fn stale_videos_after_exit_are_discarded() {
        let t0 = Instant::now();
        let mut card = CardPreview::new(CARD);
        let mut tokens = TokenSource::default();
        card.hover_enter(t0);
        let Some(Effect::FetchVideos { token, .. }) = card.poll(t0 + HOVER_DELAY, &mut tokens) else {
            panic!("expected video request");
        };
        card.hover_exit();
        assert!(!card.videos_resolved(token, Ok(vec![trailer("late")])));
        assert_eq!(card.state(), &Preview::Idle);

        card.hover_enter(t0 + ms(2000));
        let Some(Effect::FetchVideos { token: second, .. }) = card.poll(t0 + ms(2800), &mut tokens) else {
            panic!("expected second request");
        };
        assert_ne!(token, second);
        assert!(!card.videos_resolved(token, Ok(vec![trailer("late")])));
        assert!(card.videos_resolved(second, Ok(vec![trailer("fresh")])));
    }

    #[test]
    fn missing_or_failed_trailer_is_unavailable() {
        let t0 = Instant::now();
        let mut card = CardPreview::new(CARD);
        let mut tokens = TokenSource::default();
        card.hover_enter(t0);
        let Some(Effect::FetchVideos { token, .. }) = card.poll(t0 + HOVER_DELAY, &mut tokens) else {
            panic!("expected video request");
        };
        assert!(card.videos_resolved(token, Ok(Vec::new())));
        assert_eq!(card.state(), &Preview::Unavailable);
        assert_eq!(card.embed_url(), None);

        card.hover_exit();
        card.hover_enter(t0 + ms(3000));
        let Some(Effect::FetchVideos { token, .. }) = card.poll(t0 + ms(3800), &mut tokens) else {
            panic!("expected video request");
        };
        assert!(card.videos_resolved(token, Err(anyhow!("connection reset"))));
        assert_eq!(card.state(), &Preview::Unavailable);
    }

    #[test]
    fn mute_toggle_before_resolution_is_kept() {
        let t0 = Instant::now();
        let mut card = CardPreview::new(CARD);
        let mut tokens = TokenSource::default();
        card.hover_enter(t0);
        let Some(Effect::FetchVideos { token, .. }) = card.poll(t0 + HOVER_DELAY, &mut tokens) else {
            panic!("expected video request");
        };
        card.toggle_mute();
        assert!(!card.is_muted());
        card.videos_resolved(token, Ok(vec![trailer("k")]));
        assert_eq!(card.state(), &Preview::Playing { key: "k".to_string() });
    }

    #[test]
    fn card_view_uses_placeholder_for_missing_poster() {
        let mut movie = crate::fallback::fallback_movies().remove(3);
        movie.poster_path = None;
        let view = CardView::new(&movie, &ImageUrls::default());
        assert_eq!(view.poster_url, crate::tmdb::POSTER_PLACEHOLDER);
        assert_eq!(view.year, Some(1994));
        assert_eq!(view.tier, RatingTier::Excellent);
    }
}
