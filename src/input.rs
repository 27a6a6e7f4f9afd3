use std::collections::HashSet;

use glam::Vec2;
use parking_lot::RwLock;

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
}

impl KeyCode {
    /// Parses names such as `Tab`, `Up` or `r`; letters are upper-cased.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(Self::Named(key));
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_alphanumeric() => {
                Some(Self::Character(ch.to_ascii_uppercase()))
            }
            _ => None,
        }
    }

    pub fn is_shift(self) -> bool {
        matches!(
            self,
            KeyCode::Named(NamedKey::LeftShift | NamedKey::RightShift)
        )
    }
}

fn parse_named_key(name: &str) -> Option<NamedKey> {
    use NamedKey::*;
    let key = match name {
        "Tab" => Tab,
        "Up" => Up,
        "Down" => Down,
        "Escape" | "Esc" => Escape,
        "LeftShift" | "LShift" => LeftShift,
        "RightShift" | "RShift" => RightShift,
        _ => return None,
    };
    Some(key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Tab,
    Up,
    Down,
    Escape,
    LeftShift,
    RightShift,
}

/// Latest key and pointer state reported by the window.
#[derive(Debug, Default)]
pub struct InputState {
    keys: RwLock<HashSet<KeyCode>>,
    pointer: RwLock<Option<Vec2>>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&self, key: KeyCode) {
        self.keys.write().insert(key);
    }

    pub fn set_key_up(&self, key: KeyCode) {
        self.keys.write().remove(&key);
    }

    pub fn shift_held(&self) -> bool {
        self.keys.read().iter().any(|key| key.is_shift())
    }

    /// Pointer position in window pixels.
    pub fn set_pointer(&self, position: Vec2) {
        *self.pointer.write() = Some(position);
    }

    pub fn clear_pointer(&self) {
        *self.pointer.write() = None;
    }

    /// Last known pointer position, if the pointer is inside the window.
    pub fn pointer(&self) -> Option<Vec2> {
        *self.pointer.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_character_keys() {
        assert_eq!(KeyCode::from_name("Tab"), Some(KeyCode::Named(NamedKey::Tab)));
        assert_eq!(KeyCode::from_name("r"), Some(KeyCode::Character('R')));
        assert_eq!(KeyCode::from_name("rr"), None);
    }

    #[test]
    fn tracks_modifiers_and_pointer() {
        let state = InputState::new();
        assert!(!state.shift_held());
        state.set_key_down(KeyCode::Named(NamedKey::RightShift));
        assert!(state.shift_held());
        state.set_key_up(KeyCode::Named(NamedKey::RightShift));
        assert!(!state.shift_held());

        assert_eq!(state.pointer(), None);
        state.set_pointer(Vec2::new(4.0, 5.0));
        assert_eq!(state.pointer(), Some(Vec2::new(4.0, 5.0)));
        state.clear_pointer();
        assert_eq!(state.pointer(), None);
    }
}
