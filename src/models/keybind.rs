//! Key chords bound to commands

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Modifier keys for keyboard chords
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModifierKey {
    /// Control key (⌃)
    Control,
    /// Alt / Option key (⌥)
    Alt,
    /// Shift key (⇧)
    Shift,
    /// Super / Command / Windows key
    Super,
}

/// Arrow key directions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrowDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Non-modifier keys
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Letter keys A-Z, stored lowercase
    Letter(char),
    /// Number keys 0-9
    Number(u8),
    /// Function keys F1-F24
    Function(u8),
    Arrow(ArrowDirection),
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    /// A modifier pressed on its own
    Modifier(ModifierKey),
}

/// A complete chord: modifiers held plus one primary key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Keybind {
    /// Sorted and deduplicated so equal chords compare equal
    modifiers: Vec<ModifierKey>,
    key: Key,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeybindError {
    #[error("Keybind is empty")]
    Empty,

    #[error("Unknown key '{0}'")]
    UnknownKey(String),

    #[error("Keybind '{0}' has more than one primary key")]
    MultipleKeys(String),

    #[error("Keybind '{0}' has no primary key")]
    MissingKey(String),

    #[error("Keybind must have at least one modifier key")]
    NoModifiers,
}

impl Keybind {
    pub fn new(modifiers: impl IntoIterator<Item = ModifierKey>, key: Key) -> Self {
        let mut modifiers: Vec<ModifierKey> = modifiers.into_iter().collect();
        modifiers.sort();
        modifiers.dedup();
        Self { modifiers, key }
    }

    pub fn modifiers(&self) -> &[ModifierKey] {
        &self.modifiers
    }

    pub fn key(&self) -> Key {
        self.key
    }

    /// Global chords need at least one modifier so plain typing is never swallowed
    pub fn validate(&self) -> Result<(), KeybindError> {
        if self.modifiers.is_empty() {
            return Err(KeybindError::NoModifiers);
        }
        Ok(())
    }
}

fn parse_modifier(token: &str) -> Option<ModifierKey> {
    match token {
        "ctrl" | "control" => Some(ModifierKey::Control),
        "alt" | "opt" | "option" => Some(ModifierKey::Alt),
        "shift" => Some(ModifierKey::Shift),
        "super" | "cmd" | "command" | "win" | "meta" => Some(ModifierKey::Super),
        _ => None,
    }
}

fn parse_key(token: &str) -> Option<Key> {
    let key = match token {
        "up" => Key::Arrow(ArrowDirection::Up),
        "down" => Key::Arrow(ArrowDirection::Down),
        "left" => Key::Arrow(ArrowDirection::Left),
        "right" => Key::Arrow(ArrowDirection::Right),
        "space" => Key::Space,
        "enter" | "return" => Key::Enter,
        "tab" => Key::Tab,
        "esc" | "escape" => Key::Escape,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        _ => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => Key::Letter(c),
                (Some(c), None) if c.is_ascii_digit() => Key::Number(c as u8 - b'0'),
                (Some('f'), Some(_)) => {
                    let number: u8 = token[1..].parse().ok()?;
                    if !(1..=24).contains(&number) {
                        return None;
                    }
                    Key::Function(number)
                }
                _ => return None,
            }
        }
    };
    Some(key)
}

impl FromStr for Keybind {
    type Err = KeybindError;

    /// Parse chords such as `alt+shift+1` or `Ctrl+Left`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(KeybindError::Empty);
        }

        let mut modifiers = Vec::new();
        let mut key = None;
        for token in normalized.split('+').map(str::trim) {
            if let Some(modifier) = parse_modifier(token) {
                modifiers.push(modifier);
                continue;
            }
            let parsed = parse_key(token).ok_or_else(|| KeybindError::UnknownKey(token.to_string()))?;
            if key.replace(parsed).is_some() {
                return Err(KeybindError::MultipleKeys(s.to_string()));
            }
        }

        let key = key.ok_or_else(|| KeybindError::MissingKey(s.to_string()))?;
        let keybind = Keybind::new(modifiers, key);
        keybind.validate()?;
        Ok(keybind)
    }
}

impl TryFrom<String> for Keybind {
    type Error = KeybindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Keybind> for String {
    fn from(value: Keybind) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModifierKey::Control => "ctrl",
            ModifierKey::Alt => "alt",
            ModifierKey::Shift => "shift",
            ModifierKey::Super => "super",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Letter(c) => write!(f, "{c}"),
            Key::Number(n) => write!(f, "{n}"),
            Key::Function(n) => write!(f, "f{n}"),
            Key::Arrow(ArrowDirection::Up) => f.write_str("up"),
            Key::Arrow(ArrowDirection::Down) => f.write_str("down"),
            Key::Arrow(ArrowDirection::Left) => f.write_str("left"),
            Key::Arrow(ArrowDirection::Right) => f.write_str("right"),
            Key::Space => f.write_str("space"),
            Key::Enter => f.write_str("enter"),
            Key::Tab => f.write_str("tab"),
            Key::Escape => f.write_str("esc"),
            Key::Backspace => f.write_str("backspace"),
            Key::Delete => f.write_str("delete"),
            Key::Modifier(modifier) => write!(f, "{modifier}"),
        }
    }
}

impl fmt::Display for Keybind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{modifier}+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// Whether a key went down or came back up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Pressed,
    Released,
}

/// Decoded key event delivered by the keyboard hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Vec<ModifierKey>,
    pub state: KeyState,
}

impl KeyEvent {
    /// A key press
    pub fn new(modifiers: impl IntoIterator<Item = ModifierKey>, key: Key) -> Self {
        Self {
            key,
            modifiers: modifiers.into_iter().collect(),
            state: KeyState::Pressed,
        }
    }

    pub fn released(mut self) -> Self {
        self.state = KeyState::Released;
        self
    }

    pub fn is_press(&self) -> bool {
        self.state == KeyState::Pressed
    }

    pub fn is_modifier_only(&self) -> bool {
        matches!(self.key, Key::Modifier(_))
    }

    pub fn chord(&self) -> Keybind {
        Keybind::new(self.modifiers.iter().copied(), self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_modifier_order() {
        let a: Keybind = "Shift+Alt+1".parse().unwrap();
        let b: Keybind = "alt+shift+1".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "alt+shift+1");
        assert_eq!(a.key(), Key::Number(1));
    }

    #[test]
    fn parse_rejects_bad_chords() {
        assert_eq!("".parse::<Keybind>(), Err(KeybindError::Empty));
        assert_eq!("j".parse::<Keybind>(), Err(KeybindError::NoModifiers));
        assert!(matches!("alt+j+k".parse::<Keybind>(), Err(KeybindError::MultipleKeys(_))));
        assert!(matches!("alt+shift".parse::<Keybind>(), Err(KeybindError::MissingKey(_))));
        assert!(matches!("alt+f30".parse::<Keybind>(), Err(KeybindError::UnknownKey(_))));
    }

    #[test]
    fn key_event_chord_matches_parsed_keybind() {
        let event = KeyEvent::new([ModifierKey::Alt, ModifierKey::Control], Key::Arrow(ArrowDirection::Left));
        assert_eq!(event.chord(), "ctrl+alt+left".parse::<Keybind>().unwrap());
        assert!(!event.is_modifier_only());
        assert!(event.is_press());
        assert!(!event.clone().released().is_press());
        assert!(KeyEvent::new([], Key::Modifier(ModifierKey::Shift)).is_modifier_only());
    }
}
