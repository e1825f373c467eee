#![forbid(unsafe_code)]

//! Console model contract.
//!
//! The renderer never owns console state. It reads through [`ConsoleModel`]
//! and reacts to [`Change`] notifications delivered to a registered
//! [`ConsoleObserver`]. Notifications are produced synchronously by each
//! mutating call and must be applied in order: later notifications can depend
//! on the pixels left behind by earlier ones.

use crate::cell::{Attribute, Palette};

/// One unit of console mutation that the renderer must reflect in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// A glyph was stored at `(x, y)`.
    CharWritten { x: u16, y: u16, glyph: u8, attr: Attribute },
    /// Bulk-redraw hint. Carries no pixel obligation.
    RowsChanged,
    /// `lines` character rows starting at `y2` moved to start at `y1`.
    ScrollRegion { y1: u16, y2: u16, lines: u16 },
    /// The cursor blinked on or off in place.
    CursorVisibilityChanged { visible: bool },
    /// The cursor left `(from_x, from_y)`. The new position is read from the
    /// model; `to_visible` says whether it should be drawn there.
    CursorMoved { from_x: u16, from_y: u16, to_visible: bool },
}

impl Change {
    /// Short stable name for traces.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CharWritten { .. } => "char_written",
            Self::RowsChanged => "rows_changed",
            Self::ScrollRegion { .. } => "scroll_region",
            Self::CursorVisibilityChanged { .. } => "cursor_visibility",
            Self::CursorMoved { .. } => "cursor_moved",
        }
    }
}

/// Read-only view of a console, as needed by a renderer.
pub trait ConsoleModel {
    /// Width in cells.
    fn width(&self) -> u16;
    /// Height in cells.
    fn height(&self) -> u16;
    /// Glyph cell width in pixels for the active font.
    fn char_width(&self) -> u16;
    /// Glyph cell height in pixels for the active font.
    fn char_height(&self) -> u16;
    /// Packed MSB-first rows of one glyph.
    fn glyph_bitmap(&self, code: u8) -> &[u8];
    /// Palette index used to fill freshly exposed rows.
    fn background_color_index(&self) -> u8;
    fn palette(&self) -> Palette;
    /// Glyph stored at `(x, y)`; blank outside the grid.
    fn character_at(&self, x: u16, y: u16) -> u8;
    /// Attribute stored at `(x, y)`; default outside the grid.
    fn attribute_at(&self, x: u16, y: u16) -> Attribute;
    fn cursor_x(&self) -> u16;
    fn cursor_y(&self) -> u16;
    fn is_cursor_visible(&self) -> bool;
}

/// Sole observer of a console's change stream.
///
/// `model` is the console in its post-mutation state for `change`.
pub trait ConsoleObserver {
    fn on_change(&mut self, model: &dyn ConsoleModel, change: &Change);
}

impl<F> ConsoleObserver for F
where
    F: FnMut(&dyn ConsoleModel, &Change),
{
    fn on_change(&mut self, model: &dyn ConsoleModel, change: &Change) {
        self(model, change);
    }
}
