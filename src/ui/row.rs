use serde::Serialize;

use super::listeners::{ListenerKind, Subscription, WindowListeners};

pub const SCROLL_STEP: f64 = 300.0;
const EDGE_EPSILON: f64 = 10.0;
const MEDIUM_BREAKPOINT: f64 = 768.0;
const WIDE_BREAKPOINT: f64 = 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScrollMetrics {
    pub scroll_left: f64,
    pub scroll_width: f64,
    pub client_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollTo {
    pub left: f64,
    pub smooth: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Arrows {
    pub left: bool,
    pub right: bool,
}

/// Horizontal scroller of one movie row. Element-scoped: it only reacts to its
/// own scroll events.
#[derive(Debug, Clone, Default)]
pub struct RowScroller {
    metrics: Option<ScrollMetrics>,
}

impl RowScroller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_scroll(&mut self, metrics: ScrollMetrics) {
        self.metrics = Some(metrics);
    }

    pub fn arrows(&self) -> Arrows {
        match self.metrics {
            // Nothing measured yet: assume there is more to the right.
            None => Arrows {
                left: false,
                right: true,
            },
            Some(m) => Arrows {
                left: m.scroll_left > 0.0,
                right: m.scroll_left < m.scroll_width - m.client_width - EDGE_EPSILON,
            },
        }
    }

    pub fn scroll(&self, direction: ScrollDirection) -> ScrollTo {
        let current = self.metrics.map_or(0.0, |m| m.scroll_left);
        let target = match direction {
            ScrollDirection::Left => current - SCROLL_STEP,
            ScrollDirection::Right => current + SCROLL_STEP,
        };
        let max = self
            .metrics
            .map(|m| (m.scroll_width - m.client_width).max(0.0));
        let left = match max {
            Some(max) => target.clamp(0.0, max),
            None => target.max(0.0),
        };
        ScrollTo { left, smooth: true }
    }

    /// Records a requested scroll ahead of the element's own scroll event.
    pub fn scroll_to(&mut self, to: ScrollTo) {
        if let Some(m) = self.metrics.as_mut() {
            m.scroll_left = to.left;
        }
    }

    pub fn scroll_left(&self) -> f64 {
        self.metrics.map_or(0.0, |m| m.scroll_left)
    }
}

pub fn visible_card_count(viewport_width: f64) -> usize {
    if viewport_width < MEDIUM_BREAKPOINT {
        3
    } else if viewport_width < WIDE_BREAKPOINT {
        4
    } else {
        6
    }
}

/// Placeholder rows shown while the catalog loads; tracks the viewport for its
/// card count and holds a resize listener only while mounted.
#[derive(Debug)]
pub struct SkeletonRows {
    visible: usize,
    _resize: Subscription,
}

impl SkeletonRows {
    pub const ROWS: usize = 3;

    pub fn mount(listeners: &WindowListeners, viewport_width: f64) -> Self {
        Self {
            visible: visible_card_count(viewport_width),
            _resize: listeners.subscribe(ListenerKind::Resize, "skeleton-rows"),
        }
    }

    pub fn on_resize(&mut self, viewport_width: f64) {
        self.visible = visible_card_count(viewport_width);
    }

    pub fn visible_cards(&self) -> usize {
        self.visible
    }
}
