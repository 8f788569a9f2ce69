use rand::RngCore;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::card::{CardPreview, CardView, Preview};
use super::header::Header;
use super::hero::HeroBanner;
use super::keys::{Key, KeyEvent, KeyResponse};
use super::listeners::{ListenerKind, Subscription, WindowListeners};
use super::modal::{DetailsModal, DetailsState, ModalView};
use super::row::{Arrows, RowScroller, ScrollDirection, ScrollMetrics, ScrollTo, SkeletonRows};
use super::{earliest, CardId, Completion, Effect, Event, RequestToken, TokenSource};
use crate::models::{Catalog, CatalogList, Movie};
use crate::tmdb::ImageUrls;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
/// Queries of this many characters or fewer never hit the network.
pub const SHORT_QUERY_CHARS: usize = 2;
/// Skeletons stay up at least this long so the page doesn't flash.
pub const SKELETON_MIN: Duration = Duration::from_millis(1500);
const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Focus {
    pub row: usize,
    pub card: usize,
}

#[derive(Debug)]
pub struct MovieRow {
    pub kind: CatalogList,
    pub movies: Vec<Movie>,
    pub scroller: RowScroller,
}

impl MovieRow {
    pub fn title(&self) -> &'static str {
        self.kind.row_title()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub title: &'static str,
    pub cards: Vec<CardView>,
    pub arrows: Arrows,
    pub scroll_left: f64,
}

#[derive(Debug, Default)]
struct SearchState {
    open: bool,
    query: String,
    results: Vec<Movie>,
    active: bool,
    debounce_due: Option<Instant>,
    awaiting: Option<RequestToken>,
    tokens: TokenSource,
}

/// Read-only copy of the shell state, published by the session driver.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellSnapshot {
    pub phase: Phase,
    pub rows: Vec<RowView>,
    pub hero: Option<HeroBanner>,
    pub focus: Focus,
    pub search_open: bool,
    pub search_active: bool,
    pub query: String,
    pub search_results: Vec<Movie>,
    pub selected: Option<u64>,
    pub details: Option<DetailsState>,
    pub modal_muted: bool,
    pub modal: Option<ModalView>,
    pub previews: Vec<(CardId, Preview)>,
    /// Embedded player URL for every card currently playing.
    pub preview_embeds: Vec<(CardId, String)>,
    pub header_scrolled: bool,
    pub skeleton_cards: Option<usize>,
}

/// Browse page state machine: `loading -> ready`, `browsing <-> searching`,
/// with the details modal as an orthogonal overlay.
#[derive(Debug)]
pub struct Shell {
    phase: Phase,
    ready_at: Instant,
    catalog: Option<Catalog>,
    rows: Vec<MovieRow>,
    focus: Focus,
    search: SearchState,
    modal: DetailsModal,
    previews: HashMap<CardId, CardPreview>,
    video_tokens: TokenSource,
    images: ImageUrls,
    header: Header,
    skeleton: Option<SkeletonRows>,
    viewport_width: f64,
    listeners: WindowListeners,
    _keys: Subscription,
}

impl Shell {
    pub fn new(now: Instant) -> Self {
        let listeners = WindowListeners::new();
        let modal = DetailsModal::new(listeners.clone());
        Self::with_parts(now, listeners, modal)
    }

    /// Same as [`Shell::new`] with a fixed randomness source for the modal.
    pub fn with_rng(now: Instant, rng: Box<dyn RngCore + Send>) -> Self {
        let listeners = WindowListeners::new();
        let modal = DetailsModal::with_rng(listeners.clone(), rng);
        Self::with_parts(now, listeners, modal)
    }

    fn with_parts(now: Instant, listeners: WindowListeners, modal: DetailsModal) -> Self {
        Self {
            phase: Phase::Loading,
            ready_at: now + SKELETON_MIN,
            catalog: None,
            rows: Vec::new(),
            focus: Focus::default(),
            search: SearchState::default(),
            modal,
            previews: HashMap::new(),
            video_tokens: TokenSource::default(),
            images: ImageUrls::default(),
            header: Header::mount(&listeners),
            skeleton: Some(SkeletonRows::mount(&listeners, DEFAULT_VIEWPORT_WIDTH)),
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            _keys: listeners.subscribe(ListenerKind::KeyDown, "shell"),
            listeners,
        }
    }

    /// Image base used for the views in [`ShellSnapshot`].
    pub fn with_images(mut self, images: ImageUrls) -> Self {
        self.images = images;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rows(&self) -> &[MovieRow] {
        &self.rows
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn focused_movie(&self) -> Option<&Movie> {
        self.rows
            .get(self.focus.row)
            .and_then(|r| r.movies.get(self.focus.card))
    }

    pub fn hero(&self) -> Option<&Movie> {
        self.catalog.as_ref().and_then(Catalog::hero)
    }

    pub fn query(&self) -> &str {
        &self.search.query
    }

    pub fn search_results(&self) -> &[Movie] {
        &self.search.results
    }

    pub fn is_search_open(&self) -> bool {
        self.search.open
    }

    pub fn is_search_active(&self) -> bool {
        self.search.active
    }

    /// Rows (and therefore cards) are on screen.
    pub fn rows_visible(&self) -> bool {
        self.phase == Phase::Ready && !self.search.active
    }

    pub fn modal(&self) -> &DetailsModal {
        &self.modal
    }

    pub fn preview(&self, card: CardId) -> Option<&CardPreview> {
        self.previews.get(&card)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn skeleton(&self) -> Option<&SkeletonRows> {
        self.skeleton.as_ref()
    }

    pub fn listeners(&self) -> &WindowListeners {
        &self.listeners
    }

    pub fn load_catalog(&mut self, catalog: Catalog, now: Instant) {
        self.rows = CatalogList::ALL
            .iter()
            .filter(|kind| !catalog.list(**kind).is_empty())
            .map(|kind| MovieRow {
                kind: *kind,
                movies: catalog.list(*kind).to_vec(),
                scroller: RowScroller::new(),
            })
            .collect();
        info!("Catalog installed with {} non-empty rows", self.rows.len());
        self.catalog = Some(catalog);
        self.previews.clear();
        self.clamp_focus();
        self.update_phase(now);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let loading = match (self.phase, &self.catalog) {
            (Phase::Loading, Some(_)) => Some(self.ready_at),
            _ => None,
        };
        let cards = self
            .previews
            .values()
            .filter_map(CardPreview::next_deadline)
            .min();
        earliest(earliest(loading, self.search.debounce_due), cards)
    }

    /// Fires every deadline that has passed.
    pub fn poll(&mut self, now: Instant) -> Vec<Effect> {
        self.update_phase(now);
        let mut effects = Vec::new();
        if let Some(due) = self.search.debounce_due {
            if now >= due {
                self.search.debounce_due = None;
                let token = self.search.tokens.next();
                self.search.awaiting = Some(token);
                debug!("Issuing search for '{}'", self.search.query);
                effects.push(Effect::SearchMovies {
                    token,
                    query: self.search.query.clone(),
                });
            }
        }
        let tokens = &mut self.video_tokens;
        effects.extend(
            self.previews
                .values_mut()
                .filter_map(|p| p.poll(now, tokens)),
        );
        effects
    }

    pub fn handle(&mut self, event: Event, now: Instant) -> Vec<Effect> {
        let effect = match event {
            Event::CatalogLoaded(catalog) => {
                self.load_catalog(catalog, now);
                None
            }
            Event::OpenSearch => {
                self.open_search();
                None
            }
            Event::CloseSearch => {
                self.close_search();
                None
            }
            Event::ToggleSearch => {
                self.toggle_search();
                None
            }
            Event::QueryChanged(text) => {
                self.update_query(text, now);
                None
            }
            Event::Key(key) => self.handle_key(key).1,
            Event::DomKey {
                key,
                in_search_input,
            } => KeyEvent::from_dom(&key, in_search_input).and_then(|e| self.handle_key(e).1),
            Event::SelectMovie(movie) => self.select_movie(movie),
            Event::PlayHero => self.play_hero(),
            Event::CloseModal => {
                self.close_modal();
                None
            }
            Event::ToggleModalMute => {
                self.modal.toggle_mute();
                None
            }
            Event::ClickCard(card) => self.click_card(card),
            Event::HoverEnter(card) => {
                self.hover_enter(card, now);
                None
            }
            Event::HoverExit(card) => {
                self.hover_exit(card);
                None
            }
            Event::ToggleCardMute(card) => {
                self.toggle_card_mute(card);
                None
            }
            Event::WindowScrolled { y } => {
                self.window_scrolled(y);
                None
            }
            Event::WindowResized { width } => {
                self.window_resized(width);
                None
            }
            Event::RowScrolled { row, metrics } => {
                self.row_scrolled(row, metrics);
                None
            }
            Event::ScrollRow { row, direction } => {
                self.scroll_row(row, direction);
                None
            }
        };
        let mut effects: Vec<Effect> = effect.into_iter().collect();
        effects.extend(self.poll(now));
        effects
    }

    /// Routes a finished request; returns false when it was stale.
    pub fn apply(&mut self, completion: Completion) -> bool {
        match completion {
            Completion::Search { token, results } => {
                if self.search.awaiting != Some(token) {
                    debug!("Discarding stale search results ({} movies)", results.len());
                    return false;
                }
                self.search.awaiting = None;
                self.search.results = results;
                true
            }
            Completion::Details {
                token,
                movie_id,
                result,
            } => self.modal.details_resolved(token, movie_id, result),
            Completion::Videos {
                card,
                token,
                result,
            } => match self.previews.get_mut(&card) {
                Some(preview) => preview.videos_resolved(token, result),
                None => {
                    debug!("Discarding videos for unmounted card {:?}", card);
                    false
                }
            },
        }
    }

    pub fn open_search(&mut self) {
        self.search.open = true;
    }

    pub fn close_search(&mut self) {
        self.search.open = false;
        self.clear_query();
    }

    pub fn toggle_search(&mut self) {
        if self.search.open {
            self.close_search();
        } else {
            self.open_search();
        }
    }

    pub fn update_query(&mut self, text: String, now: Instant) {
        self.search.query = text;
        // Whatever is in flight answers an older query now.
        self.search.awaiting = None;
        if self.search.query.chars().count() > SHORT_QUERY_CHARS {
            self.set_search_active(true);
            self.search.debounce_due = Some(now + SEARCH_DEBOUNCE);
        } else {
            self.search.debounce_due = None;
            self.search.results.clear();
            self.set_search_active(false);
        }
    }

    fn clear_query(&mut self) {
        self.search.query.clear();
        self.search.awaiting = None;
        self.search.debounce_due = None;
        self.search.results.clear();
        self.set_search_active(false);
    }

    fn set_search_active(&mut self, active: bool) {
        if active && !self.search.active {
            // Rows unmount while searching.
            self.previews.clear();
        }
        self.search.active = active;
    }

    pub fn select_movie(&mut self, movie: Movie) -> Option<Effect> {
        self.modal.open(movie)
    }

    pub fn close_modal(&mut self) {
        self.modal.close();
    }

    pub fn play_hero(&mut self) -> Option<Effect> {
        let movie = self.hero()?.clone();
        self.select_movie(movie)
    }

    pub fn click_card(&mut self, card: CardId) -> Option<Effect> {
        let movie = self.movie_at(card)?.clone();
        self.select_movie(movie)
    }

    pub fn hover_enter(&mut self, card: CardId, now: Instant) {
        if !self.rows_visible() || self.movie_at(card).is_none() {
            return;
        }
        self.previews
            .entry(card)
            .or_insert_with(|| CardPreview::new(card))
            .hover_enter(now);
    }

    pub fn hover_exit(&mut self, card: CardId) {
        self.previews.remove(&card);
    }

    /// Mute lives on the card; it never reaches the click handler.
    pub fn toggle_card_mute(&mut self, card: CardId) {
        if let Some(preview) = self.previews.get_mut(&card) {
            preview.toggle_mute();
        }
    }

    /// Returns the native-event disposition plus any request the key caused.
    pub fn handle_key(&mut self, event: KeyEvent) -> (KeyResponse, Option<Effect>) {
        if self.modal.is_open() {
            return (self.modal.handle_key(event), None);
        }
        if event.in_search_input && self.search.open {
            return (KeyResponse::ignored(), None);
        }
        match event.key {
            Key::Up => {
                self.focus.row = self.focus.row.saturating_sub(1);
                self.clamp_focus();
                (KeyResponse::consumed(), None)
            }
            Key::Down => {
                self.focus.row += 1;
                self.clamp_focus();
                (KeyResponse::consumed(), None)
            }
            Key::Left => {
                self.focus.card = self.focus.card.saturating_sub(1);
                (KeyResponse::consumed(), None)
            }
            Key::Right => {
                self.focus.card += 1;
                self.clamp_focus();
                (KeyResponse::consumed(), None)
            }
            Key::Enter => {
                let effect = self.focused_movie().cloned().and_then(|m| self.select_movie(m));
                (KeyResponse::consumed(), effect)
            }
            Key::Char('/') => {
                self.open_search();
                (KeyResponse::consumed(), None)
            }
            Key::Escape if self.search.open => {
                self.close_search();
                (KeyResponse::handled(), None)
            }
            _ => (KeyResponse::ignored(), None),
        }
    }

    pub fn window_scrolled(&mut self, y: f64) {
        self.header.on_scroll(y);
    }

    pub fn window_resized(&mut self, width: f64) {
        self.viewport_width = width;
        if let Some(skeleton) = self.skeleton.as_mut() {
            skeleton.on_resize(width);
        }
    }

    pub fn row_scrolled(&mut self, row: usize, metrics: ScrollMetrics) {
        if let Some(r) = self.rows.get_mut(row) {
            r.scroller.on_scroll(metrics);
        }
    }

    /// Arrow click: returns where the host should scroll the row element.
    pub fn scroll_row(&mut self, row: usize, direction: ScrollDirection) -> Option<ScrollTo> {
        let scroller = &mut self.rows.get_mut(row)?.scroller;
        let to = scroller.scroll(direction);
        scroller.scroll_to(to);
        Some(to)
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        let open = self.modal.current();
        let mut previews: Vec<(CardId, Preview)> = self
            .previews
            .iter()
            .map(|(id, p)| (*id, p.state().clone()))
            .collect();
        previews.sort_by_key(|(id, _)| (id.row, id.movie_id));
        let mut preview_embeds: Vec<(CardId, String)> = self
            .previews
            .iter()
            .filter_map(|(id, p)| p.embed_url().map(|url| (*id, url)))
            .collect();
        preview_embeds.sort_by_key(|(id, _)| (id.row, id.movie_id));
        ShellSnapshot {
            phase: self.phase,
            rows: self
                .rows
                .iter()
                .map(|r| RowView {
                    title: r.title(),
                    cards: r
                        .movies
                        .iter()
                        .map(|m| CardView::new(m, &self.images))
                        .collect(),
                    arrows: r.scroller.arrows(),
                    scroll_left: r.scroller.scroll_left(),
                })
                .collect(),
            hero: self.hero().map(|m| HeroBanner::new(m, &self.images)),
            focus: self.focus,
            search_open: self.search.open,
            search_active: self.search.active,
            query: self.search.query.clone(),
            search_results: self.search.results.clone(),
            selected: open.map(|o| o.movie.id),
            details: open.map(|o| o.details.clone()),
            modal_muted: open.map_or(true, |o| o.muted),
            modal: self.modal.view(&self.images),
            previews,
            preview_embeds,
            header_scrolled: self.header.is_scrolled(),
            skeleton_cards: self.skeleton.as_ref().map(SkeletonRows::visible_cards),
        }
    }

    fn movie_at(&self, card: CardId) -> Option<&Movie> {
        self.rows
            .get(card.row)?
            .movies
            .iter()
            .find(|m| m.id == card.movie_id)
    }

    fn update_phase(&mut self, now: Instant) {
        if self.phase == Phase::Loading && self.catalog.is_some() && now >= self.ready_at {
            self.phase = Phase::Ready;
            self.skeleton = None;
            info!("Browse page ready");
        }
    }

    fn clamp_focus(&mut self) {
        let Some(last_row) = self.rows.len().checked_sub(1) else {
            self.focus = Focus::default();
            return;
        };
        self.focus.row = self.focus.row.min(last_row);
        let last_card = self.rows[self.focus.row].movies.len().saturating_sub(1);
        self.focus.card = self.focus.card.min(last_card);
    }
}
