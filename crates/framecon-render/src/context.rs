#![forbid(unsafe_code)]

//! Render context: everything the draw path needs, owned in one place.
//!
//! A [`RenderContext`] is built once per attach from the console model and
//! the surface's pixel format. It is only mutated by the explicit re-sync
//! calls, never while a draw is in progress.

use std::fmt;

use framecon_core::{ConsoleModel, Rgb};

use crate::glyph_cache::{GlyphCache, GlyphCacheError};
use crate::palette::PaletteTable;
use crate::surface::PixelFormat;

/// Render-session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderConfig {
    /// Deliver a [`DispatchTrace`](crate::DispatchTrace) to the session's
    /// trace hook for every notification.
    pub trace_dispatch: bool,
}

impl RenderConfig {
    #[must_use]
    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    /// The console has no cells to draw.
    ZeroSizedConsole { cols: u16, rows: u16 },
    /// The glyph mask table could not be built.
    GlyphCache(GlyphCacheError),
}

impl fmt::Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSizedConsole { cols, rows } => {
                write!(f, "console is {cols}x{rows} cells; nothing to render")
            }
            Self::GlyphCache(err) => write!(f, "glyph cache: {err}"),
        }
    }
}

impl std::error::Error for AttachError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::GlyphCache(err) => Some(err),
            Self::ZeroSizedConsole { .. } => None,
        }
    }
}

impl From<GlyphCacheError> for AttachError {
    fn from(err: GlyphCacheError) -> Self {
        Self::GlyphCache(err)
    }
}

#[derive(Debug, Clone)]
pub struct RenderContext {
    pub(crate) glyphs: GlyphCache,
    pub(crate) palette: PaletteTable,
    pub(crate) cursor_color: u32,
    format: PixelFormat,
}

impl RenderContext {
    /// Build palette, glyph masks and cursor color for `model`.
    pub fn attach(model: &dyn ConsoleModel, format: PixelFormat) -> Result<Self, AttachError> {
        let (cols, rows) = (model.width(), model.height());
        if cols == 0 || rows == 0 {
            return Err(AttachError::ZeroSizedConsole { cols, rows });
        }
        let glyphs = GlyphCache::from_model(model)?;
        let palette = PaletteTable::build(&model.palette(), format);
        crate::debug!(
            cols,
            rows,
            char_width = model.char_width(),
            char_height = model.char_height(),
            ?format,
            "render context attached"
        );
        Ok(Self {
            glyphs,
            palette,
            cursor_color: format.map_rgb(Rgb::WHITE),
            format,
        })
    }

    /// Re-read the model's palette.
    pub fn sync_palette(&mut self, model: &dyn ConsoleModel) {
        self.palette = PaletteTable::build(&model.palette(), self.format);
    }

    /// Rebuild glyph masks from the model's active font.
    ///
    /// On error the previous masks stay in use; callers treat the error as
    /// fatal for rendering.
    pub fn rebuild_glyphs(&mut self, model: &dyn ConsoleModel) -> Result<(), GlyphCacheError> {
        if let Err(err) = self.glyphs.rebuild(model) {
            crate::error!(%err, "glyph cache rebuild failed");
            return Err(err);
        }
        Ok(())
    }

    #[must_use]
    pub fn glyphs(&self) -> &GlyphCache {
        &self.glyphs
    }

    #[must_use]
    pub fn palette(&self) -> &PaletteTable {
        &self.palette
    }

    /// Native value of the cursor strip color.
    #[must_use]
    pub fn cursor_color(&self) -> u32 {
        self.cursor_color
    }

    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[must_use]
    pub fn char_width(&self) -> u16 {
        self.glyphs.char_width()
    }

    #[must_use]
    pub fn char_height(&self) -> u16 {
        self.glyphs.char_height()
    }
}
