#![forbid(unsafe_code)]

//! Palette mapping: abstract RGB color table → native pixel values.
//!
//! Built once per attach. The table is a snapshot: later edits to the
//! console's palette are not seen until the owner rebuilds it.

use framecon_core::{Attribute, PALETTE_SIZE, Palette};

use crate::surface::PixelFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteTable {
    entries: [u32; PALETTE_SIZE],
}

impl PaletteTable {
    /// Map every abstract color through `format`.
    #[must_use]
    pub fn build(palette: &Palette, format: PixelFormat) -> Self {
        Self {
            entries: palette.map(|rgb| format.map_rgb(rgb)),
        }
    }

    /// Native color for a palette index. Indices are masked into range.
    #[inline]
    #[must_use]
    pub fn color(&self, index: u8) -> u32 {
        self.entries[usize::from(index) & (PALETTE_SIZE - 1)]
    }

    #[inline]
    #[must_use]
    pub fn foreground(&self, attr: Attribute) -> u32 {
        self.color(attr.fg())
    }

    #[inline]
    #[must_use]
    pub fn background(&self, attr: Attribute) -> u32 {
        self.color(attr.bg())
    }

    /// Fill color for rows exposed by a scroll.
    #[must_use]
    pub fn background_color_of(&self, index: u8) -> u32 {
        self.color(index)
    }

    #[must_use]
    pub fn entries(&self) -> &[u32; PALETTE_SIZE] {
        &self.entries
    }
}
