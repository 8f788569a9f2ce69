use super::listeners::{ListenerKind, Subscription, WindowListeners};

const SCROLLED_THRESHOLD: f64 = 50.0;

/// Top bar; switches to the solid background once the page scrolls.
#[derive(Debug)]
pub struct Header {
    scrolled: bool,
    _scroll: Subscription,
}

impl Header {
    pub fn mount(listeners: &WindowListeners) -> Self {
        Self {
            scrolled: false,
            _scroll: listeners.subscribe(ListenerKind::Scroll, "header"),
        }
    }

    pub fn on_scroll(&mut self, y: f64) {
        self.scrolled = y > SCROLLED_THRESHOLD;
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }
}
