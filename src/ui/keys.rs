use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Space,
    Char(char),
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Option<Self> {
        let key = match key {
            "ArrowUp" => Key::Up,
            "ArrowDown" => Key::Down,
            "ArrowLeft" => Key::Left,
            "ArrowRight" => Key::Right,
            "Enter" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            " " | "Spacebar" => Key::Space,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    /// Focus is inside the search input.
    pub in_search_input: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            in_search_input: false,
        }
    }

    pub fn in_search_input(key: Key) -> Self {
        Self {
            key,
            in_search_input: true,
        }
    }

    pub fn from_dom(key: &str, in_search_input: bool) -> Option<Self> {
        Key::from_dom(key).map(|key| Self {
            key,
            in_search_input,
        })
    }
}

/// What the host must do with the native event after the core handled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyResponse {
    pub handled: bool,
    pub prevent_default: bool,
}

impl KeyResponse {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn handled() -> Self {
        Self {
            handled: true,
            prevent_default: false,
        }
    }

    pub fn consumed() -> Self {
        Self {
            handled: true,
            prevent_default: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_dom_key_names() {
        assert_eq!(Key::from_dom("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_dom(" "), Some(Key::Space));
        assert_eq!(Key::from_dom("/"), Some(Key::Char('/')));
        assert_eq!(Key::from_dom("M"), Some(Key::Char('M')));
        assert_eq!(Key::from_dom("Shift"), None);
    }

    #[test]
    fn dom_event_keeps_input_focus() {
        let event = KeyEvent::from_dom("Escape", true).expect("mapped");
        assert_eq!(event.key, Key::Escape);
        assert!(event.in_search_input);
        assert_eq!(KeyEvent::from_dom("Tab", false), None);
    }
}
