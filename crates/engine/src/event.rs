use std::fmt;

use serde::{Deserialize, Serialize};

/// One game-state change: `(type, number, value)`.
///
/// Forwarded as-is; interpreting or rejecting odd values is up to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRecord {
    /// Element category tag (`S`, `L`, `W`, `E`, ...).
    pub kind: u8,
    /// Element number.
    pub number: i32,
    /// `0` off, `1` on, or an analogue level.
    pub value: i32,
}

impl EventRecord {
    /// Build a record.
    pub const fn new(kind: u8, number: i32, value: i32) -> Self {
        Self {
            kind,
            number,
            value,
        }
    }

    /// Category of the addressed element.
    pub const fn element(&self) -> ElementKind {
        ElementKind::from_tag(self.kind)
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_ascii_graphic() {
            write!(f, "{}{}={}", self.kind as char, self.number, self.value)
        } else {
            write!(f, "\\x{:02x}{}={}", self.kind, self.number, self.value)
        }
    }
}

/// Element category derived from an event's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `S`: solenoid / coil.
    Solenoid,
    /// `L`: lamp.
    Lamp,
    /// `W`: switch / GI.
    Switch,
    /// `E`: named element.
    Named,
    /// Any other tag.
    Other(u8),
}

impl ElementKind {
    /// Classify a type tag.
    pub const fn from_tag(tag: u8) -> Self {
        match tag {
            b'S' => ElementKind::Solenoid,
            b'L' => ElementKind::Lamp,
            b'W' => ElementKind::Switch,
            b'E' => ElementKind::Named,
            other => ElementKind::Other(other),
        }
    }

    /// Short human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            ElementKind::Solenoid => "solenoid",
            ElementKind::Lamp => "lamp",
            ElementKind::Switch => "switch",
            ElementKind::Named => "element",
            ElementKind::Other(_) => "output",
        }
    }
}
