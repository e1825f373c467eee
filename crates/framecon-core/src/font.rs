#![forbid(unsafe_code)]

//! Fixed-size monochrome bitmap fonts.
//!
//! A font is 256 glyphs of `char_width × char_height` pixels. Each glyph row is
//! packed most-significant-bit-first into `ceil(char_width / 8)` bytes, so a
//! 12-pixel-wide row occupies two bytes and the last four bits are padding.

use std::fmt;

/// Number of glyph codes in a font.
pub const GLYPH_COUNT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontError {
    /// Cell width or height is zero.
    ZeroSized,
    /// Raw data length does not match `256 × height × stride`.
    LengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSized => write!(f, "font cell dimensions must be non-zero"),
            Self::LengthMismatch { expected, actual } => {
                write!(f, "font data is {actual} bytes, expected {expected}")
            }
        }
    }
}

impl std::error::Error for FontError {}

/// Packed monochrome bitmap font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapFont {
    char_width: u16,
    char_height: u16,
    stride: usize,
    data: Vec<u8>,
}

impl BitmapFont {
    /// Bytes per packed glyph row for a given pixel width.
    #[must_use]
    pub const fn stride_for(char_width: u16) -> usize {
        (char_width as usize).div_ceil(8)
    }

    /// Wrap raw glyph data: 256 glyphs, `char_height` rows each, rows of
    /// [`stride_for`](Self::stride_for) bytes.
    pub fn from_raw(char_width: u16, char_height: u16, data: Vec<u8>) -> Result<Self, FontError> {
        if char_width == 0 || char_height == 0 {
            return Err(FontError::ZeroSized);
        }
        let stride = Self::stride_for(char_width);
        let expected = GLYPH_COUNT * stride * char_height as usize;
        if data.len() != expected {
            return Err(FontError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            char_width,
            char_height,
            stride,
            data,
        })
    }

    /// Build a font where every glyph comes from `glyph(code, x, y) -> ink`.
    pub fn from_fn<F>(char_width: u16, char_height: u16, mut glyph: F) -> Result<Self, FontError>
    where
        F: FnMut(u8, u16, u16) -> bool,
    {
        if char_width == 0 || char_height == 0 {
            return Err(FontError::ZeroSized);
        }
        let stride = Self::stride_for(char_width);
        let mut data = vec![0u8; GLYPH_COUNT * stride * char_height as usize];
        for code in 0..GLYPH_COUNT {
            for y in 0..char_height {
                let row = (code * char_height as usize + y as usize) * stride;
                for x in 0..char_width {
                    if glyph(code as u8, x, y) {
                        data[row + (x as usize >> 3)] |= 0x80 >> (x & 7);
                    }
                }
            }
        }
        Ok(Self {
            char_width,
            char_height,
            stride,
            data,
        })
    }

    /// Deterministic placeholder font.
    ///
    /// Control codes and space are blank; every other glyph gets a one-pixel
    /// border plus a code-seeded dot pattern so distinct codes render
    /// distinctly. Used when no font file is configured.
    pub fn procedural(char_width: u16, char_height: u16) -> Result<Self, FontError> {
        Self::from_fn(char_width, char_height, |code, x, y| {
            if code <= b' ' || code == 0x7F {
                return false;
            }
            let seed = u32::from(code).wrapping_mul(0x9E37_79B9);
            let border = x == 0 || y == 0 || x + 1 == char_width || y + 1 == char_height;
            let bit_index = (u32::from(x) + u32::from(y) * 7) & 31;
            let hash_bit = ((seed >> bit_index) & 1) == 1;
            let dot = (u32::from(x) * 3 + u32::from(y)).wrapping_add(seed) % 5 == 0;
            border || (hash_bit && dot)
        })
    }

    #[must_use]
    pub fn char_width(&self) -> u16 {
        self.char_width
    }

    #[must_use]
    pub fn char_height(&self) -> u16 {
        self.char_height
    }

    /// Bytes per packed row.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Packed rows of one glyph (`char_height × stride` bytes).
    #[must_use]
    pub fn glyph(&self, code: u8) -> &[u8] {
        let len = self.stride * self.char_height as usize;
        let start = code as usize * len;
        &self.data[start..start + len]
    }

    /// Whether pixel `(x, y)` of `code` is ink. Out-of-range coordinates are not.
    #[cfg(test)]
    fn ink(&self, code: u8, x: u16, y: u16) -> bool {
        if x >= self.char_width || y >= self.char_height {
            return false;
        }
        let byte = self.glyph(code)[y as usize * self.stride + (x as usize >> 3)];
        byte & (0x80 >> (x & 7)) != 0
    }
}
