#![forbid(unsafe_code)]

//! Cell and cursor drawing.
//!
//! Both operations touch only the target cell's pixel rectangle. A failed
//! lock drops the draw and reports [`DrawOutcome::Skipped`]; nothing is
//! retried and the console model is unaffected.

use framecon_core::{Attribute, ConsoleModel};

use crate::context::RenderContext;
use crate::surface::{LockedSurface, PixelRect, Surface, SurfaceError};

/// Height of the cursor strip in pixels.
pub const CURSOR_HEIGHT: u32 = 2;
/// Distance from the cell's bottom edge to the top of the cursor strip.
pub const CURSOR_OFFSET_FROM_BOTTOM: u32 = 3;

/// Result of one draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn,
    /// The cell lies entirely outside the surface.
    Clipped,
    /// The cursor is not visible in the model; nothing was drawn.
    Hidden,
    /// The surface could not be locked; the update was dropped.
    Skipped(SurfaceError),
}

impl DrawOutcome {
    #[must_use]
    pub const fn is_skipped(self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

impl RenderContext {
    /// Pixel rectangle of cell `(col, row)`.
    #[must_use]
    pub fn cell_rect(&self, col: u16, row: u16) -> PixelRect {
        let cw = u32::from(self.char_width());
        let ch = u32::from(self.char_height());
        PixelRect::new(u32::from(col) * cw, u32::from(row) * ch, cw, ch)
    }

    /// Pixel rectangle of the cursor strip in cell `(col, row)`.
    #[must_use]
    pub fn cursor_rect(&self, col: u16, row: u16) -> PixelRect {
        let cell = self.cell_rect(col, row);
        let y = (cell.y + cell.h).saturating_sub(CURSOR_OFFSET_FROM_BOTTOM);
        PixelRect::new(cell.x, y.max(cell.y), cell.w, CURSOR_HEIGHT.min(cell.h))
    }

    /// Draw `glyph` at `(col, row)` in the colors of `attr`.
    pub fn draw_cell<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        col: u16,
        row: u16,
        glyph: u8,
        attr: Attribute,
    ) -> DrawOutcome {
        let fg = self.palette.foreground(attr);
        let bg = self.palette.background(attr);

        let mut locked = match LockedSurface::acquire(surface) {
            Ok(locked) => locked,
            Err(err) => {
                crate::debug!(col, row, %err, "cell draw skipped");
                return DrawOutcome::Skipped(err);
            }
        };
        let cell = self.cell_rect(col, row);
        let Some(visible) = cell.clip(locked.width(), locked.height()) else {
            return DrawOutcome::Clipped;
        };

        let cw = cell.w as usize;
        let mask = self.glyphs.mask(glyph);
        for (dy, mask_row) in mask.chunks_exact(cw).take(visible.h as usize).enumerate() {
            let span = locked.span_mut(visible.x, visible.y + dy as u32, visible.w);
            for (px, &ink) in span.iter_mut().zip(mask_row) {
                *px = if ink != 0 { fg } else { bg };
            }
        }
        DrawOutcome::Drawn
    }

    /// Draw the cursor strip at `(col, row)` if `model` reports it visible.
    pub fn draw_cursor<S: Surface + ?Sized>(
        &self,
        model: &dyn ConsoleModel,
        surface: &mut S,
        col: u16,
        row: u16,
    ) -> DrawOutcome {
        if !model.is_cursor_visible() {
            return DrawOutcome::Hidden;
        }
        let rect = self.cursor_rect(col, row);
        if rect.clip(surface.width(), surface.height()).is_none() {
            return DrawOutcome::Clipped;
        }
        match surface.fill_rect(rect, self.cursor_color) {
            Ok(()) => DrawOutcome::Drawn,
            Err(err) => {
                crate::debug!(col, row, %err, "cursor draw skipped");
                DrawOutcome::Skipped(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{PixelFormat, SoftwareSurface};
    use framecon_core::{BitmapFont, Console};

    fn setup(cols: u16, rows: u16, cw: u16, ch: u16) -> (Console, RenderContext, SoftwareSurface) {
        let font = BitmapFont::from_fn(cw, ch, |code, x, y| code == b'#' && (x + y) % 2 == 0).unwrap();
        let console = Console::new(cols, rows, font);
        let ctx = RenderContext::attach(&console, PixelFormat::Argb8888).unwrap();
        let surface = SoftwareSurface::new(
            u32::from(cols * cw),
            u32::from(rows * ch),
            PixelFormat::Argb8888,
        );
        (console, ctx, surface)
    }

    #[test]
    fn draw_cell_touches_only_its_rectangle() {
        let (_console, ctx, mut surface) = setup(3, 2, 4, 4);
        surface.fill_rect(PixelRect::new(0, 0, 12, 8), 0xDEAD_BEEF).unwrap();
        let outcome = ctx.draw_cell(&mut surface, 1, 1, b'#', Attribute::new(15, 1));
        assert_eq!(outcome, DrawOutcome::Drawn);

        let fg = ctx.palette().color(15);
        let bg = ctx.palette().color(1);
        for y in 0..8 {
            for x in 0..12 {
                let px = surface.pixel(x, y).unwrap();
                let inside = (4..8).contains(&x) && (4..8).contains(&y);
                if !inside {
                    assert_eq!(px, 0xDEAD_BEEF, "({x},{y}) touched");
                } else if ((x - 4) + (y - 4)) % 2 == 0 {
                    assert_eq!(px, fg);
                } else {
                    assert_eq!(px, bg);
                }
            }
        }
        assert!(!surface.is_locked());
    }

    #[test]
    fn lock_failure_skips_and_leaves_pixels() {
        let (_console, ctx, mut surface) = setup(1, 1, 4, 4);
        surface.fail_next_locks(1);
        let outcome = ctx.draw_cell(&mut surface, 0, 0, b'#', Attribute::new(15, 0));
        assert_eq!(outcome, DrawOutcome::Skipped(SurfaceError::LockUnavailable));
        assert!(surface.snapshot().iter().all(|&px| px == 0));
        assert!(!surface.is_locked());
    }

    #[test]
    fn off_surface_cell_is_clipped() {
        let (_console, ctx, mut surface) = setup(2, 2, 4, 4);
        assert_eq!(
            ctx.draw_cell(&mut surface, 5, 0, b'#', Attribute::default()),
            DrawOutcome::Clipped
        );
        assert!(!surface.is_locked());
    }

    #[test]
    fn cursor_strip_sits_three_pixels_above_bottom() {
        let (console, ctx, mut surface) = setup(2, 2, 8, 16);
        assert_eq!(ctx.cursor_rect(1, 1), PixelRect::new(8, 29, 8, 2));
        assert_eq!(ctx.draw_cursor(&console, &mut surface, 1, 1), DrawOutcome::Drawn);

        let white = ctx.cursor_color();
        for y in 16..32 {
            let expected = if (29..31).contains(&y) { white } else { 0 };
            assert!(
                (8..16).all(|x| surface.pixel(x, y) == Some(expected)),
                "row {y}"
            );
        }
        assert!((0..8).all(|x| surface.pixel(x, 29) == Some(0)));
    }

    #[test]
    fn hidden_cursor_is_not_drawn() {
        let (mut console, ctx, mut surface) = setup(1, 1, 8, 8);
        console.set_cursor_visible(false);
        assert_eq!(ctx.draw_cursor(&console, &mut surface, 0, 0), DrawOutcome::Hidden);
        assert_eq!(surface.lock_count(), 0);
    }

    #[test]
    fn short_cells_keep_cursor_inside() {
        let (_console, ctx, _surface) = setup(1, 1, 2, 2);
        assert_eq!(ctx.cursor_rect(0, 0), PixelRect::new(0, 0, 2, 2));
    }
}
