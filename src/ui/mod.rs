//! Headless interaction core of the browse page.
//!
//! Controllers are plain state machines: hosts feed them events together with
//! the current [`Instant`], execute the [`Effect`]s they return, and report
//! back with a [`Completion`]. Timers are deadlines polled through
//! `next_deadline`/`poll`, so dropping a controller cancels its timers.
use anyhow::Result;
use serde::Serialize;
use tokio::time::Instant;

use crate::models::{Catalog, Movie, MovieDetails, Video};

pub mod card;
pub mod header;
pub mod hero;
pub mod keys;
pub mod listeners;
pub mod modal;
pub mod row;
pub mod session;
pub mod shell;

pub use keys::{Key, KeyEvent, KeyResponse};
pub use shell::Shell;

/// Monotonic id attached to every outgoing request; a completion is applied
/// only while its token is still the one its owner is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct TokenSource {
    last: u64,
}

impl TokenSource {
    pub fn next(&mut self) -> RequestToken {
        self.last += 1;
        RequestToken(self.last)
    }
}

/// A card is a movie within a particular row; the same movie can sit in several rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CardId {
    pub row: usize,
    pub movie_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SearchMovies {
        token: RequestToken,
        query: String,
    },
    FetchDetails {
        token: RequestToken,
        movie_id: u64,
    },
    FetchVideos {
        card: CardId,
        token: RequestToken,
        movie_id: u64,
    },
}

#[derive(Debug)]
pub enum Completion {
    Search {
        token: RequestToken,
        results: Vec<Movie>,
    },
    Details {
        token: RequestToken,
        movie_id: u64,
        result: Result<MovieDetails>,
    },
    Videos {
        card: CardId,
        token: RequestToken,
        result: Result<Vec<Video>>,
    },
}

#[derive(Debug, Clone)]
pub enum Event {
    CatalogLoaded(Catalog),
    OpenSearch,
    CloseSearch,
    ToggleSearch,
    QueryChanged(String),
    Key(KeyEvent),
    SelectMovie(Movie),
    PlayHero,
    CloseModal,
    ToggleModalMute,
    ClickCard(CardId),
    HoverEnter(CardId),
    HoverExit(CardId),
    ToggleCardMute(CardId),
    WindowScrolled { y: f64 },
    WindowResized { width: f64 },
    RowScrolled { row: usize, metrics: row::ScrollMetrics },
    /// Row arrow clicked.
    ScrollRow { row: usize, direction: row::ScrollDirection },
    /// Raw `KeyboardEvent.key`; unmapped keys are ignored.
    DomKey { key: String, in_search_input: bool },
}

pub(crate) fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}
