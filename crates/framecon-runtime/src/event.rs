#![forbid(unsafe_code)]

//! Canonical input events delivered by a [`Backend`](crate::Backend).
//!
//! # Design Notes
//!
//! - Pointer coordinates are in pixels, 0-indexed from the surface origin.
//! - `KeyEventKind` defaults to `Press` when the backend cannot tell.
//! - `Modifiers` use bitflags for easy combination.

use bitflags::bitflags;

/// Canonical input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The user asked to close the window.
    Quit,

    /// A keyboard event.
    Key(KeyEvent),

    /// A pointer (mouse) event. The console ignores these.
    Pointer(PointerEvent),
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a key press with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// The console byte this key prints, if it is a printable ASCII key
    /// without Ctrl or Alt held.
    #[must_use]
    pub fn printable_byte(&self) -> Option<u8> {
        if self.ctrl() || self.alt() {
            return None;
        }
        match self.code {
            KeyCode::Char(c) if c.is_ascii_graphic() || c == ' ' => Some(c as u8),
            _ => None,
        }
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key, after keyboard layout translation.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Delete,
    Home,
    End,
    Up,
    Down,
    Left,
    Right,
    /// Function key (F1-F24).
    F(u8),
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

bitflags! {
    /// Modifier keys held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub x: u32,
    pub y: u32,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    #[must_use]
    pub const fn new(kind: PointerEventKind, x: u32, y: u32) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    Down(PointerButton),
    Up(PointerButton),
    Moved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

impl PointerButton {
    #[must_use]
    pub const fn flag(self) -> PointerButtons {
        match self {
            Self::Left => PointerButtons::LEFT,
            Self::Middle => PointerButtons::MIDDLE,
            Self::Right => PointerButtons::RIGHT,
        }
    }
}

bitflags! {
    /// Pointer buttons currently held.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PointerButtons: u8 {
        const LEFT   = 0b001;
        const MIDDLE = 0b010;
        const RIGHT  = 0b100;
    }
}

/// Last known pointer position and held buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerState {
    pub x: u32,
    pub y: u32,
    pub buttons: PointerButtons,
}

impl PointerState {
    /// Fold one pointer event into the state.
    pub fn apply(&mut self, event: &PointerEvent) {
        self.x = event.x;
        self.y = event.y;
        match event.kind {
            PointerEventKind::Down(button) => self.buttons.insert(button.flag()),
            PointerEventKind::Up(button) => self.buttons.remove(button.flag()),
            PointerEventKind::Moved => {}
        }
    }

    #[must_use]
    pub fn is_pressed(&self, button: PointerButton) -> bool {
        self.buttons.contains(button.flag())
    }
}
