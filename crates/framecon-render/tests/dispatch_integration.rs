//! End-to-end dispatch tests: console mutations and raw notifications
//! rendered into a software surface.

use std::cell::RefCell;
use std::rc::Rc;

use framecon_core::{
    Attribute, BitmapFont, Change, Console, ConsoleModel, DEFAULT_PALETTE, Palette, Rgb,
};
use framecon_render::{
    DispatchOutcome, GlyphCacheError, PixelFormat, PixelRect, RenderContext, RenderSession,
    SessionObserver, SoftwareSurface, Surface, SurfaceError, glyph_cache::INK,
};

// ============================================================================
// Helpers
// ============================================================================

fn session_for(console: &Console) -> RenderSession<SoftwareSurface> {
    let ctx = RenderContext::attach(console, PixelFormat::Argb8888).unwrap();
    let width = u32::from(console.width()) * u32::from(console.char_width());
    let height = u32::from(console.height()) * u32::from(console.char_height());
    let surface = SoftwareSurface::new(width, height, PixelFormat::Argb8888);
    RenderSession::new(ctx, Rc::new(RefCell::new(surface)))
}

fn cell_pixels(session: &RenderSession<SoftwareSurface>, col: u16, row: u16) -> Vec<u32> {
    let rect = session.context().cell_rect(col, row);
    session.surface().borrow().read_rect(rect)
}

/// What a cell looks like when drawn from scratch with `glyph`/`attr`.
fn reference_cell(
    session: &RenderSession<SoftwareSurface>,
    col: u16,
    row: u16,
    glyph: u8,
    attr: Attribute,
) -> Vec<u32> {
    let ctx = session.context();
    let (w, h) = {
        let surface = session.surface().borrow();
        (surface.width(), surface.height())
    };
    let mut scratch = SoftwareSurface::new(w, h, ctx.format());
    ctx.draw_cell(&mut scratch, col, row, glyph, attr);
    scratch.read_rect(ctx.cell_rect(col, row))
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn two_by_one_console_draws_inked_glyph() {
    let font = BitmapFont::from_fn(2, 2, |code, _, _| code == b'A').unwrap();
    let console = Console::new(2, 1, font);
    let mut session = session_for(&console);

    let outcome = session.dispatch(
        &console,
        &Change::CharWritten {
            x: 0,
            y: 0,
            glyph: b'A',
            attr: Attribute(0x01),
        },
    );
    assert_eq!(outcome, DispatchOutcome::Applied);

    let palette = *session.context().palette();
    let surface = session.surface().borrow();
    for y in 0..2 {
        for x in 0..2 {
            assert_eq!(surface.pixel(x, y), Some(palette.color(1)), "({x},{y})");
        }
        // Second cell untouched.
        assert_eq!(surface.pixel(2, y), Some(0));
        assert_eq!(surface.pixel(3, y), Some(0));
    }
}

#[test]
fn partially_inked_glyph_uses_background_elsewhere() {
    let font = BitmapFont::from_fn(2, 2, |code, x, y| code == b'A' && x == y).unwrap();
    let console = Console::new(2, 1, font);
    let mut session = session_for(&console);
    session.dispatch(
        &console,
        &Change::CharWritten {
            x: 0,
            y: 0,
            glyph: b'A',
            attr: Attribute(0x01),
        },
    );

    let palette = *session.context().palette();
    let (fg, bg) = (palette.color(1), palette.color(0));
    assert_eq!(cell_pixels(&session, 0, 0), vec![fg, bg, bg, fg]);
}

#[test]
fn char_written_is_idempotent() {
    let console = Console::new(4, 2, BitmapFont::procedural(8, 16).unwrap());
    let mut session = session_for(&console);
    let change = Change::CharWritten {
        x: 2,
        y: 1,
        glyph: b'Q',
        attr: Attribute::new(14, 4),
    };

    session.dispatch(&console, &change);
    let once = session.surface().borrow().snapshot();
    session.dispatch(&console, &change);
    assert_eq!(session.surface().borrow().snapshot(), once);
}

#[test]
fn repeated_cursor_move_in_place_matches_single_draw() {
    let mut console = Console::new(3, 2, BitmapFont::procedural(8, 16).unwrap());
    console.print_str("ab");
    console.cursor_goto_xy(1, 1);
    let mut session = session_for(&console);

    let moved = Change::CursorMoved {
        from_x: 1,
        from_y: 1,
        to_visible: true,
    };
    session.dispatch(&console, &moved);
    let after_one = session.surface().borrow().snapshot();
    session.dispatch(&console, &moved);
    assert_eq!(session.surface().borrow().snapshot(), after_one);

    // Single draw of the cell followed by the cursor strip.
    let ctx = session.context().clone();
    let mut expected = SoftwareSurface::new(24, 32, PixelFormat::Argb8888);
    ctx.draw_cell(
        &mut expected,
        1,
        1,
        console.character_at(1, 1),
        console.attribute_at(1, 1),
    );
    ctx.draw_cursor(&console, &mut expected, 1, 1);
    assert_eq!(expected.snapshot(), after_one);
}

#[test]
fn scroll_moves_rows_and_fills_exposed_band() {
    let console = Console::new(2, 10, BitmapFont::procedural(4, 2).unwrap());
    let mut session = session_for(&console);
    {
        let mut surface = session.surface().borrow_mut();
        for row in 0..10u32 {
            surface
                .fill_rect(PixelRect::new(0, row * 2, 8, 2), 0x00AB_0000 + row)
                .unwrap();
        }
    }
    let before = session.surface().borrow().snapshot();
    let row_px = |pixels: &[u32], row: usize| pixels[row * 16..(row + 1) * 16].to_vec();

    let outcome = session.dispatch(
        &console,
        &Change::ScrollRegion {
            y1: 0,
            y2: 3,
            lines: 5,
        },
    );
    assert_eq!(outcome, DispatchOutcome::Applied);

    let background = session
        .context()
        .palette()
        .background_color_of(console.background_color_index());
    let surface = session.surface().borrow();
    let after = surface.snapshot();
    for row in 0..5 {
        assert_eq!(row_px(&after, row), row_px(&before, row + 3), "row {row}");
    }
    for row in 5..8 {
        assert!(row_px(&after, row).iter().all(|&px| px == background), "row {row}");
    }
    for row in 8..10 {
        assert_eq!(row_px(&after, row), row_px(&before, row), "row {row}");
    }
    assert_eq!(surface.presents(), 1);
    assert_eq!(surface.last_present(), Some(None));
}

#[test]
fn attribute_nibbles_stay_in_palette_range() {
    let font = BitmapFont::from_fn(2, 1, |code, x, _| code == b'#' && x == 0).unwrap();
    let console = Console::new(1, 1, font);
    let mut session = session_for(&console);
    session.dispatch(
        &console,
        &Change::CharWritten {
            x: 0,
            y: 0,
            glyph: b'#',
            attr: Attribute(0xFF),
        },
    );
    let palette = *session.context().palette();
    assert_eq!(palette.color(0x1F), palette.color(0x0F));
    assert_eq!(palette.background_color_of(0xF3), palette.color(3));
    assert_eq!(cell_pixels(&session, 0, 0), vec![palette.color(15); 2]);
}

#[test]
fn hiding_cursor_restores_cell_content() {
    let mut console = Console::new(3, 1, BitmapFont::procedural(8, 16).unwrap());
    let shared = session_for(&console).into_shared();
    console.set_observer(Some(SessionObserver::boxed(&shared)));

    console.print_str("AB");
    console.cursor_goto_xy(1, 0);
    let session = shared.borrow();
    let cursor = session.context().cursor_rect(1, 0);
    let cursor_px = session.surface().borrow().read_rect(cursor);
    assert!(cursor_px.iter().all(|&px| px == session.context().cursor_color()));
    drop(session);

    console.set_cursor_visible(false);
    let session = shared.borrow();
    let expected = reference_cell(&session, 1, 0, b'B', console.attribute_at(1, 0));
    assert_eq!(cell_pixels(&session, 1, 0), expected);
}

#[test]
fn lock_failure_drops_one_update_and_next_notification_heals() {
    let mut console = Console::new(3, 1, BitmapFont::procedural(8, 16).unwrap());
    let shared = session_for(&console).into_shared();
    console.set_observer(Some(SessionObserver::boxed(&shared)));

    shared.borrow().surface().borrow_mut().fail_next_locks(1);
    console.print_char(b'A');

    let session = shared.borrow();
    let stats = session.stats();
    assert_eq!(stats.notifications, 2);
    assert_eq!(stats.skipped, 1);
    // The cursor move repaints (0,0) from the model.
    let expected = reference_cell(&session, 0, 0, b'A', console.attribute_at(0, 0));
    assert_eq!(cell_pixels(&session, 0, 0), expected);
    assert!(!session.surface().borrow().is_locked());
}

#[test]
fn busy_surface_is_reported_not_retried() {
    let console = Console::new(1, 1, BitmapFont::procedural(4, 4).unwrap());
    let mut session = session_for(&console);
    let surface = Rc::clone(session.surface());
    let guard = surface.borrow();
    let outcome = session.dispatch(&console, &Change::CursorVisibilityChanged { visible: true });
    assert_eq!(outcome, DispatchOutcome::Skipped(SurfaceError::Busy));
    drop(guard);
    assert_eq!(surface.borrow().lock_count(), 0);
}

#[test]
fn unregistered_console_stops_dispatching() {
    let mut console = Console::new(4, 2, BitmapFont::procedural(8, 8).unwrap());
    let shared = session_for(&console).into_shared();
    console.set_observer(Some(SessionObserver::boxed(&shared)));
    console.print_char(b'x');
    let seen = shared.borrow().stats().notifications;
    let pixels = shared.borrow().surface().borrow().snapshot();

    assert!(console.set_observer(None).is_some());
    console.print_str("more text\n");
    console.blink_cursor();

    let session = shared.borrow();
    assert_eq!(session.stats().notifications, seen);
    assert_eq!(session.surface().borrow().snapshot(), pixels);
}

#[test]
fn console_scroll_keeps_pixels_in_step_with_grid() {
    let mut console = Console::new(3, 3, BitmapFont::procedural(8, 8).unwrap());
    let shared = session_for(&console).into_shared();
    console.set_observer(Some(SessionObserver::boxed(&shared)));
    console.clear();
    console.set_cursor_visible(false);
    console.print_str("abc\ndef\nghi\njk");

    let session = shared.borrow();
    for row in 0..3u16 {
        for col in 0..3u16 {
            let expected = reference_cell(
                &session,
                col,
                row,
                console.character_at(col, row),
                console.attribute_at(col, row),
            );
            assert_eq!(cell_pixels(&session, col, row), expected, "cell ({col},{row})");
        }
    }
}

// ============================================================================
// Re-sync
// ============================================================================

/// Delegates to a console but serves truncated glyph bitmaps.
struct TruncatedGlyphs<'a>(&'a Console);

impl ConsoleModel for TruncatedGlyphs<'_> {
    fn width(&self) -> u16 {
        self.0.width()
    }
    fn height(&self) -> u16 {
        self.0.height()
    }
    fn char_width(&self) -> u16 {
        self.0.char_width()
    }
    fn char_height(&self) -> u16 {
        self.0.char_height()
    }
    fn glyph_bitmap(&self, _code: u8) -> &[u8] {
        &[]
    }
    fn background_color_index(&self) -> u8 {
        self.0.background_color_index()
    }
    fn palette(&self) -> Palette {
        self.0.palette()
    }
    fn character_at(&self, x: u16, y: u16) -> u8 {
        self.0.character_at(x, y)
    }
    fn attribute_at(&self, x: u16, y: u16) -> Attribute {
        self.0.attribute_at(x, y)
    }
    fn cursor_x(&self) -> u16 {
        self.0.cursor_x()
    }
    fn cursor_y(&self) -> u16 {
        self.0.cursor_y()
    }
    fn is_cursor_visible(&self) -> bool {
        self.0.is_cursor_visible()
    }
}

fn write_at_origin(glyph: u8, attr: Attribute) -> Change {
    Change::CharWritten {
        x: 0,
        y: 0,
        glyph,
        attr,
    }
}

#[test]
fn palette_edit_is_invisible_until_resync() {
    let font = BitmapFont::from_fn(2, 2, |_, _, _| false).unwrap();
    let mut console = Console::new(2, 1, font);
    let mut session = session_for(&console);
    let blank = write_at_origin(b' ', Attribute(0x00));
    let format = PixelFormat::Argb8888;

    console.set_palette_entry(0, Rgb::new(1, 2, 3));
    session.dispatch(&console, &blank);
    let stale = session.surface().borrow().pixel(0, 0);
    assert_eq!(stale, Some(format.map_rgb(DEFAULT_PALETTE[0])));

    session.resync(&console).unwrap();
    session.dispatch(&console, &blank);
    let fresh = session.surface().borrow().pixel(0, 0);
    assert_eq!(fresh, Some(format.map_rgb(Rgb::new(1, 2, 3))));
}

#[test]
fn resync_after_font_swap_uses_new_masks() {
    let small = BitmapFont::from_fn(2, 2, |_, _, _| false).unwrap();
    let mut console = Console::new(2, 1, small);
    let ctx = RenderContext::attach(&console, PixelFormat::Argb8888).unwrap();
    let surface = SoftwareSurface::new(8, 4, PixelFormat::Argb8888);
    let mut session = RenderSession::new(ctx, Rc::new(RefCell::new(surface)));

    console.set_font(BitmapFont::from_fn(4, 4, |code, _, _| code == b'A').unwrap());
    assert_eq!(session.context().char_width(), 2);
    session.resync(&console).unwrap();
    assert_eq!(
        (session.context().char_width(), session.context().char_height()),
        (4, 4)
    );
    assert!(session.context().glyphs().mask(b'A').iter().all(|&m| m == INK));

    let outcome = session.dispatch(&console, &write_at_origin(b'A', Attribute(0x01)));
    assert_eq!(outcome, DispatchOutcome::Applied);
    let ink = session.context().palette().color(1);
    let pixels = session
        .surface()
        .borrow()
        .read_rect(PixelRect::new(0, 0, 4, 4));
    assert_eq!(pixels, vec![ink; 16]);
}

#[test]
fn failed_rebuild_keeps_drawing_with_old_masks() {
    let font = BitmapFont::from_fn(2, 2, |code, x, y| code == b'A' && x == y).unwrap();
    let console = Console::new(2, 1, font);

    let mut ctx = RenderContext::attach(&console, PixelFormat::Argb8888).unwrap();
    let before = ctx.glyphs().clone();
    let err = ctx.rebuild_glyphs(&TruncatedGlyphs(&console)).unwrap_err();
    assert!(matches!(err, GlyphCacheError::InvalidFont { .. }));
    assert_eq!(ctx.glyphs(), &before);

    let mut session = session_for(&console);
    let expected = reference_cell(&session, 0, 0, b'A', Attribute(0x01));
    assert!(session.resync(&TruncatedGlyphs(&console)).is_err());
    session.dispatch(&console, &write_at_origin(b'A', Attribute(0x01)));
    assert_eq!(cell_pixels(&session, 0, 0), expected);
}
