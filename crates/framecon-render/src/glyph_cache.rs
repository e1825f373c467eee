#![forbid(unsafe_code)]

//! Glyph mask cache.
//!
//! Expands a packed 1-bit-per-pixel font into one byte per pixel (`0` or
//! `255`) for all 256 glyph codes, so the cell renderer selects a color per
//! pixel with a single test instead of bit twiddling.
//!
//! Layout: glyph `c`, row `y`, column `x` lives at
//! `(c * char_height + y) * char_width + x`. The table is always exactly
//! `256 × char_width × char_height` bytes.
//!
//! Rebuilding produces a complete new table before the old one is released,
//! so a failed rebuild leaves the previous glyphs intact.

use std::fmt;

use framecon_core::{BitmapFont, ConsoleModel, GLYPH_COUNT};

/// Mask value for an inked pixel.
pub const INK: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphCacheError {
    /// Zero cell dimension, or a glyph bitmap shorter than
    /// `ceil(char_width / 8) × char_height` bytes.
    InvalidFont { code: u8 },
    /// The mask table could not be allocated.
    Allocation { bytes: usize },
}

impl fmt::Display for GlyphCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFont { code } => write!(f, "invalid glyph bitmap for code {code}"),
            Self::Allocation { bytes } => write!(f, "failed to allocate {bytes} byte glyph table"),
        }
    }
}

impl std::error::Error for GlyphCacheError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphCache {
    char_width: u16,
    char_height: u16,
    masks: Vec<u8>,
}

impl GlyphCache {
    /// Expand 256 packed glyphs supplied by `bitmap(code)`.
    ///
    /// Each glyph row is `ceil(char_width / 8)` bytes, most significant bit
    /// first; exactly `char_width` bits are consumed per row.
    pub fn build<'a, F>(char_width: u16, char_height: u16, mut bitmap: F) -> Result<Self, GlyphCacheError>
    where
        F: FnMut(u8) -> &'a [u8],
    {
        if char_width == 0 || char_height == 0 {
            return Err(GlyphCacheError::InvalidFont { code: 0 });
        }
        let cw = usize::from(char_width);
        let ch = usize::from(char_height);
        let stride = cw.div_ceil(8);
        let bytes = GLYPH_COUNT
            .checked_mul(cw)
            .and_then(|n| n.checked_mul(ch))
            .ok_or(GlyphCacheError::Allocation { bytes: usize::MAX })?;

        let mut masks = Vec::new();
        masks
            .try_reserve_exact(bytes)
            .map_err(|_| GlyphCacheError::Allocation { bytes })?;

        for code in 0..GLYPH_COUNT {
            let code = code as u8;
            let packed = bitmap(code);
            if packed.len() < stride * ch {
                return Err(GlyphCacheError::InvalidFont { code });
            }
            for row in packed.chunks_exact(stride).take(ch) {
                masks.extend((0..cw).map(|x| {
                    if row[x >> 3] & (0x80 >> (x & 7)) != 0 {
                        INK
                    } else {
                        0
                    }
                }));
            }
        }
        debug_assert_eq!(masks.len(), bytes);

        crate::debug!(char_width, char_height, bytes, "glyph cache built");
        Ok(Self {
            char_width,
            char_height,
            masks,
        })
    }

    pub fn from_font(font: &BitmapFont) -> Result<Self, GlyphCacheError> {
        Self::build(font.char_width(), font.char_height(), |code| font.glyph(code))
    }

    pub fn from_model(model: &dyn ConsoleModel) -> Result<Self, GlyphCacheError> {
        Self::build(model.char_width(), model.char_height(), |code| {
            model.glyph_bitmap(code)
        })
    }

    /// Replace the table with one built from `model`'s active font.
    ///
    /// On error the current table is kept.
    pub fn rebuild(&mut self, model: &dyn ConsoleModel) -> Result<(), GlyphCacheError> {
        let fresh = Self::from_model(model)?;
        *self = fresh;
        Ok(())
    }

    #[must_use]
    pub fn char_width(&self) -> u16 {
        self.char_width
    }

    #[must_use]
    pub fn char_height(&self) -> u16 {
        self.char_height
    }

    /// Bytes per glyph (`char_width × char_height`).
    #[must_use]
    pub fn glyph_len(&self) -> usize {
        usize::from(self.char_width) * usize::from(self.char_height)
    }

    /// Total table size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// The whole mask of one glyph, row-major.
    #[inline]
    #[must_use]
    pub fn mask(&self, code: u8) -> &[u8] {
        let len = self.glyph_len();
        let start = usize::from(code) * len;
        &self.masks[start..start + len]
    }

    /// One mask row of one glyph. Empty when `y` is out of range.
    #[must_use]
    pub fn row(&self, code: u8, y: u16) -> &[u8] {
        if y >= self.char_height {
            return &[];
        }
        let cw = usize::from(self.char_width);
        let start = usize::from(y) * cw;
        &self.mask(code)[start..start + cw]
    }
}
