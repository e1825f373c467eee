#![forbid(unsafe_code)]

//! Console cell: the fundamental unit of the grid.
//!
//! A cell is a glyph code plus an [`Attribute`] byte. Colors are indices into
//! a fixed 16-entry [`Palette`]; the renderer maps the palette to native pixel
//! values once and keeps only the indices in the grid.

use std::fmt;

/// Number of entries in the console color table.
pub const PALETTE_SIZE: usize = 16;

/// 24-bit color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);
}

/// Abstract console color table.
pub type Palette = [Rgb; PALETTE_SIZE];

/// The 16 standard VGA text-mode colors.
pub const DEFAULT_PALETTE: Palette = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0x00, 0x00, 0xAA),
    Rgb::new(0x00, 0xAA, 0x00),
    Rgb::new(0x00, 0xAA, 0xAA),
    Rgb::new(0xAA, 0x00, 0x00),
    Rgb::new(0xAA, 0x00, 0xAA),
    Rgb::new(0xAA, 0x55, 0x00),
    Rgb::new(0xAA, 0xAA, 0xAA),
    Rgb::new(0x55, 0x55, 0x55),
    Rgb::new(0x55, 0x55, 0xFF),
    Rgb::new(0x55, 0xFF, 0x55),
    Rgb::new(0x55, 0xFF, 0xFF),
    Rgb::new(0xFF, 0x55, 0x55),
    Rgb::new(0xFF, 0x55, 0xFF),
    Rgb::new(0xFF, 0xFF, 0x55),
    Rgb::new(0xFF, 0xFF, 0xFF),
];

/// Packed color attribute.
///
/// Low nibble is the foreground palette index, high nibble the background
/// palette index. Accessors always return values in `0..16`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attribute(pub u8);

impl Attribute {
    /// Build an attribute from foreground/background indices (masked to 4 bits).
    #[must_use]
    pub const fn new(fg: u8, bg: u8) -> Self {
        Self((fg & 0x0F) | ((bg & 0x0F) << 4))
    }

    #[must_use]
    pub const fn fg(self) -> u8 {
        self.0 & 0x0F
    }

    #[must_use]
    pub const fn bg(self) -> u8 {
        (self.0 >> 4) & 0x0F
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl From<u8> for Attribute {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attribute(fg={}, bg={})", self.fg(), self.bg())
    }
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub glyph: u8,
    pub attr: Attribute,
}

impl Cell {
    #[must_use]
    pub const fn new(glyph: u8, attr: Attribute) -> Self {
        Self { glyph, attr }
    }

    /// Blank the cell, keeping only the background of `attr`.
    pub fn erase(&mut self, attr: Attribute) {
        self.glyph = b' ';
        self.attr = attr;
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            glyph: b' ',
            attr: Attribute::new(7, 0),
        }
    }
}
