//! Presentation helpers shared by the card, hero and modal views.
use chrono::{Datelike, NaiveDate};
use rand::{Rng, RngCore};
use serde::Serialize;

/// Three-step rating classification used for badge colours everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingTier {
    Excellent,
    Good,
    Fair,
}

impl RatingTier {
    pub fn classify(rating: f64) -> Self {
        if rating >= 7.5 {
            RatingTier::Excellent
        } else if rating >= 6.0 {
            RatingTier::Good
        } else {
            RatingTier::Fair
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RatingTier::Excellent => "excellent",
            RatingTier::Good => "good",
            RatingTier::Fair => "fair",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingTier::Excellent => "Excellent Rating",
            RatingTier::Good => "Good Rating",
            RatingTier::Fair => "Fair Rating",
        }
    }
}

pub fn maturity_label(rating: f64) -> &'static str {
    if rating >= 8.0 {
        "13+"
    } else if rating >= 6.0 {
        "16+"
    } else {
        "18+"
    }
}

pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn format_rating(rating: f64) -> String {
    format!("★ {:.1}", rating)
}

pub fn release_year(date: Option<NaiveDate>) -> Option<i32> {
    date.map(|d| d.year())
}

pub fn mood_line(rating: f64) -> &'static str {
    if rating >= 7.0 {
        "Exciting, Thrilling"
    } else {
        "Entertaining, Dramatic"
    }
}

/// Cuts at `max_chars` characters and appends `...` when anything was dropped.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

pub fn youtube_embed_url(key: &str, muted: bool) -> String {
    format!(
        "https://www.youtube.com/embed/{key}?autoplay=1&mute={}&controls=1&rel=0&modestbranding=1",
        u8::from(muted)
    )
}

pub const MATCH_MIN: u8 = 80;
pub const MATCH_MAX: u8 = 99;

/// Decorative "% Match" figure. Not meaningful; only the range is fixed.
pub fn match_percentage(rng: &mut dyn RngCore) -> u8 {
    rng.gen_range(MATCH_MIN..=MATCH_MAX)
}
