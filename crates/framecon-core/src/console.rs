#![forbid(unsafe_code)]

//! Reference in-memory console.
//!
//! [`Console`] is a small, complete console model: a [`Grid`] of cells, a
//! cursor with a tick-driven blink, the current attribute, a 16-entry palette
//! and the active [`BitmapFont`]. Every mutating call delivers the matching
//! [`Change`] notifications to the registered observer before it returns.
//!
//! Text semantics are minimal: printable bytes are stored and
//! advance the cursor, the right edge wraps, the bottom edge scrolls,
//! `'\n'` is newline + carriage return, `'\r'` is carriage return and
//! `0x08` moves the cursor left.

use std::fmt;

use crate::cell::{Attribute, Cell, DEFAULT_PALETTE, PALETTE_SIZE, Palette, Rgb};
use crate::font::BitmapFont;
use crate::grid::Grid;
use crate::model::{Change, ConsoleModel, ConsoleObserver};

/// Console behavior knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Number of [`Console::blink_cursor`] ticks between visibility flips.
    /// Zero disables blinking.
    pub blink_interval: u32,
    /// Attribute in effect after construction.
    pub initial_attribute: Attribute,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            blink_interval: 30,
            initial_attribute: Attribute::new(7, 0),
        }
    }
}

impl ConsoleConfig {
    #[must_use]
    pub fn with_blink_interval(mut self, ticks: u32) -> Self {
        self.blink_interval = ticks;
        self
    }

    #[must_use]
    pub fn with_initial_attribute(mut self, attr: Attribute) -> Self {
        self.initial_attribute = attr;
        self
    }
}

pub struct Console {
    grid: Grid,
    font: BitmapFont,
    palette: Palette,
    attr: Attribute,
    cursor_x: u16,
    cursor_y: u16,
    cursor_visible: bool,
    blink_ticks: u32,
    config: ConsoleConfig,
    observer: Option<Box<dyn ConsoleObserver>>,
}

impl Console {
    /// Create a console of `cols × rows` cells.
    pub fn new(cols: u16, rows: u16, font: BitmapFont) -> Self {
        Self::with_config(cols, rows, font, ConsoleConfig::default())
    }

    pub fn with_config(cols: u16, rows: u16, font: BitmapFont, config: ConsoleConfig) -> Self {
        let attr = config.initial_attribute;
        let mut grid = Grid::new(cols, rows);
        grid.erase_all(attr);
        Self {
            grid,
            font,
            palette: DEFAULT_PALETTE,
            attr,
            cursor_x: 0,
            cursor_y: 0,
            cursor_visible: true,
            blink_ticks: 0,
            config,
            observer: None,
        }
    }

    /// Create the largest console that fits a `width_px × height_px` surface.
    pub fn for_pixels(width_px: u32, height_px: u32, font: BitmapFont) -> Self {
        let cols = width_px / u32::from(font.char_width());
        let rows = height_px / u32::from(font.char_height());
        Self::new(
            u16::try_from(cols).unwrap_or(u16::MAX),
            u16::try_from(rows).unwrap_or(u16::MAX),
            font,
        )
    }

    /// Register (`Some`) or unregister (`None`) the change observer.
    ///
    /// Returns the previously registered observer. Unregister before tearing
    /// down whatever the observer draws into.
    pub fn set_observer(
        &mut self,
        observer: Option<Box<dyn ConsoleObserver>>,
    ) -> Option<Box<dyn ConsoleObserver>> {
        if self.observer.is_some() && observer.is_some() {
            crate::warn!("replacing a registered console observer");
        }
        std::mem::replace(&mut self.observer, observer)
    }

    #[must_use]
    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn font(&self) -> &BitmapFont {
        &self.font
    }

    /// Swap the active font.
    ///
    /// Observers are not notified; renderers rebuild their glyph tables
    /// explicitly.
    pub fn set_font(&mut self, font: BitmapFont) {
        crate::debug!(
            char_width = font.char_width(),
            char_height = font.char_height(),
            "console font swapped"
        );
        self.font = font;
    }

    /// Current attribute applied to newly printed cells.
    #[must_use]
    pub fn attribute(&self) -> Attribute {
        self.attr
    }

    pub fn set_attribute(&mut self, attr: impl Into<Attribute>) {
        self.attr = attr.into();
    }

    /// Replace one palette entry. `index` is masked to the palette size.
    ///
    /// No notification is emitted; renderers re-sync their palette tables
    /// explicitly.
    pub fn set_palette_entry(&mut self, index: u8, rgb: Rgb) {
        self.palette[index as usize % PALETTE_SIZE] = rgb;
    }

    /// Stored cell at `(x, y)`.
    pub fn cell(&self, x: u16, y: u16) -> Option<Cell> {
        self.grid.cell(x, y).copied()
    }

    /// Blank the whole grid with the current attribute and home the cursor.
    pub fn clear(&mut self) {
        let attr = self.attr;
        self.grid.erase_all(attr);
        for y in 0..self.grid.rows() {
            for x in 0..self.grid.cols() {
                self.notify(Change::CharWritten {
                    x,
                    y,
                    glyph: b' ',
                    attr,
                });
            }
        }
        self.notify(Change::RowsChanged);
        let (from_x, from_y) = (self.cursor_x, self.cursor_y);
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.notify_cursor_moved(from_x, from_y);
    }

    /// Print one byte at the cursor.
    pub fn print_char(&mut self, byte: u8) {
        if self.grid.cols() == 0 || self.grid.rows() == 0 {
            return;
        }
        let (from_x, from_y) = (self.cursor_x, self.cursor_y);
        match byte {
            b'\n' => {
                self.cursor_x = 0;
                self.line_feed(from_x, from_y);
            }
            b'\r' => self.cursor_x = 0,
            0x08 => self.cursor_x = self.cursor_x.saturating_sub(1),
            glyph => {
                let attr = self.attr;
                if let Some(cell) = self.grid.cell_mut(from_x, from_y) {
                    *cell = Cell::new(glyph, attr);
                }
                self.notify(Change::CharWritten {
                    x: from_x,
                    y: from_y,
                    glyph,
                    attr,
                });
                if from_x + 1 >= self.grid.cols() {
                    self.cursor_x = 0;
                    self.line_feed(from_x, from_y);
                } else {
                    self.cursor_x += 1;
                }
            }
        }
        self.notify_cursor_moved(from_x, from_y);
    }

    pub fn print_str(&mut self, text: &str) {
        for byte in text.bytes() {
            self.print_char(byte);
        }
    }

    /// Move the cursor, clamped to the grid.
    pub fn cursor_goto_xy(&mut self, x: u16, y: u16) {
        let (from_x, from_y) = (self.cursor_x, self.cursor_y);
        self.cursor_x = x.min(self.grid.cols().saturating_sub(1));
        self.cursor_y = y.min(self.grid.rows().saturating_sub(1));
        self.notify_cursor_moved(from_x, from_y);
    }

    /// Show or hide the cursor. Emits only when the state changes.
    pub fn set_cursor_visible(&mut self, visible: bool) {
        if self.cursor_visible == visible {
            return;
        }
        self.cursor_visible = visible;
        self.blink_ticks = 0;
        self.notify(Change::CursorVisibilityChanged { visible });
    }

    /// Advance the blink clock by one tick, flipping visibility every
    /// `blink_interval` ticks.
    pub fn blink_cursor(&mut self) {
        if self.config.blink_interval == 0 {
            return;
        }
        self.blink_ticks += 1;
        if self.blink_ticks >= self.config.blink_interval {
            self.blink_ticks = 0;
            self.cursor_visible = !self.cursor_visible;
            let visible = self.cursor_visible;
            self.notify(Change::CursorVisibilityChanged { visible });
        }
    }

    fn line_feed(&mut self, from_x: u16, from_y: u16) {
        if self.cursor_y + 1 < self.grid.rows() {
            self.cursor_y += 1;
        } else {
            self.scroll_up(from_x, from_y);
        }
    }

    /// Scroll the whole grid up one row.
    ///
    /// The cell under the cursor mark is repainted first so the blit does
    /// not carry the mark into the row above.
    fn scroll_up(&mut self, mark_x: u16, mark_y: u16) {
        if self.cursor_visible
            && let Some(cell) = self.grid.cell(mark_x, mark_y).copied()
        {
            self.notify(Change::CharWritten {
                x: mark_x,
                y: mark_y,
                glyph: cell.glyph,
                attr: cell.attr,
            });
        }

        let rows = self.grid.rows();
        let blank = self.attr;
        self.grid.scroll_up(0, rows, 1, blank);
        crate::trace!(rows, "console scrolled one row");

        if rows > 1 {
            self.notify(Change::ScrollRegion {
                y1: 0,
                y2: 1,
                lines: rows - 1,
            });
        } else {
            for x in 0..self.grid.cols() {
                self.notify(Change::CharWritten {
                    x,
                    y: 0,
                    glyph: b' ',
                    attr: blank,
                });
            }
        }
    }

    fn notify_cursor_moved(&mut self, from_x: u16, from_y: u16) {
        let to_visible = self.cursor_visible;
        self.notify(Change::CursorMoved {
            from_x,
            from_y,
            to_visible,
        });
    }

    fn notify(&mut self, change: Change) {
        // Taken out for the call so the observer can read `self`.
        if let Some(mut observer) = self.observer.take() {
            observer.on_change(&*self, &change);
            if self.observer.is_none() {
                self.observer = Some(observer);
            }
        }
    }
}

impl ConsoleModel for Console {
    fn width(&self) -> u16 {
        self.grid.cols()
    }

    fn height(&self) -> u16 {
        self.grid.rows()
    }

    fn char_width(&self) -> u16 {
        self.font.char_width()
    }

    fn char_height(&self) -> u16 {
        self.font.char_height()
    }

    fn glyph_bitmap(&self, code: u8) -> &[u8] {
        self.font.glyph(code)
    }

    fn background_color_index(&self) -> u8 {
        self.attr.bg()
    }

    fn palette(&self) -> Palette {
        self.palette
    }

    fn character_at(&self, x: u16, y: u16) -> u8 {
        self.grid.cell(x, y).map_or(b' ', |c| c.glyph)
    }

    fn attribute_at(&self, x: u16, y: u16) -> Attribute {
        self.grid
            .cell(x, y)
            .map_or_else(|| Cell::default().attr, |c| c.attr)
    }

    fn cursor_x(&self) -> u16 {
        self.cursor_x
    }

    fn cursor_y(&self) -> u16 {
        self.cursor_y
    }

    fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("cols", &self.grid.cols())
            .field("rows", &self.grid.rows())
            .field("cursor", &(self.cursor_x, self.cursor_y))
            .field("cursor_visible", &self.cursor_visible)
            .field("attr", &self.attr)
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_console(cols: u16, rows: u16) -> (Console, Rc<RefCell<Vec<Change>>>) {
        let font = BitmapFont::procedural(2, 2).unwrap();
        let config = ConsoleConfig::default().with_blink_interval(2);
        let mut console = Console::with_config(cols, rows, font, config);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        console.set_observer(Some(Box::new(
            move |_: &dyn ConsoleModel, change: &Change| sink.borrow_mut().push(*change),
        )));
        (console, log)
    }

    #[test]
    fn print_emits_char_then_cursor_move() {
        let (mut console, log) = recording_console(4, 2);
        console.set_attribute(0x21);
        console.print_char(b'A');
        assert_eq!(
            *log.borrow(),
            vec![
                Change::CharWritten {
                    x: 0,
                    y: 0,
                    glyph: b'A',
                    attr: Attribute(0x21)
                },
                Change::CursorMoved {
                    from_x: 0,
                    from_y: 0,
                    to_visible: true
                },
            ]
        );
        assert_eq!((console.cursor_x(), console.cursor_y()), (1, 0));
        assert_eq!(console.character_at(0, 0), b'A');
    }

    #[test]
    fn wrap_at_right_edge_moves_to_next_row() {
        let (mut console, _log) = recording_console(2, 3);
        console.print_str("abc");
        assert_eq!((console.cursor_x(), console.cursor_y()), (1, 1));
        assert_eq!(console.character_at(1, 0), b'b');
        assert_eq!(console.character_at(0, 1), b'c');
    }

    #[test]
    fn newline_on_last_row_scrolls() {
        let (mut console, log) = recording_console(3, 3);
        console.print_str("a\nb\nc");
        log.borrow_mut().clear();
        console.print_char(b'\n');

        let changes = log.borrow().clone();
        assert_eq!(
            changes,
            vec![
                // Restore under the cursor mark before the blit.
                Change::CharWritten {
                    x: 1,
                    y: 2,
                    glyph: b' ',
                    attr: Attribute::new(7, 0)
                },
                Change::ScrollRegion {
                    y1: 0,
                    y2: 1,
                    lines: 2
                },
                Change::CursorMoved {
                    from_x: 1,
                    from_y: 2,
                    to_visible: true
                },
            ]
        );
        assert_eq!(console.character_at(0, 0), b'b');
        assert_eq!(console.character_at(0, 1), b'c');
        assert_eq!(console.character_at(0, 2), b' ');
        assert_eq!((console.cursor_x(), console.cursor_y()), (0, 2));
    }

    #[test]
    fn goto_clamps_to_grid() {
        let (mut console, log) = recording_console(4, 2);
        console.cursor_goto_xy(10, 10);
        assert_eq!((console.cursor_x(), console.cursor_y()), (3, 1));
        assert_eq!(
            log.borrow().last(),
            Some(&Change::CursorMoved {
                from_x: 0,
                from_y: 0,
                to_visible: true
            })
        );
    }

    #[test]
    fn blink_flips_visibility_every_interval() {
        let (mut console, log) = recording_console(2, 2);
        console.blink_cursor();
        assert!(log.borrow().is_empty());
        console.blink_cursor();
        assert!(!console.is_cursor_visible());
        assert_eq!(
            *log.borrow(),
            vec![Change::CursorVisibilityChanged { visible: false }]
        );
    }

    #[test]
    fn clear_paints_every_cell_then_hints_rows() {
        let (mut console, log) = recording_console(2, 2);
        console.print_str("xy");
        log.borrow_mut().clear();
        console.clear();
        let changes = log.borrow();
        let writes = changes
            .iter()
            .filter(|c| matches!(c, Change::CharWritten { glyph: b' ', .. }))
            .count();
        assert_eq!(writes, 4);
        assert_eq!(changes[4], Change::RowsChanged);
        assert_eq!((console.cursor_x(), console.cursor_y()), (0, 0));
    }

    #[test]
    fn unregistered_console_emits_nothing() {
        let (mut console, log) = recording_console(2, 2);
        assert!(console.set_observer(None).is_some());
        console.print_char(b'z');
        assert!(log.borrow().is_empty());
        assert!(!console.has_observer());
    }

    #[test]
    fn for_pixels_divides_by_cell_size() {
        let font = BitmapFont::procedural(8, 16).unwrap();
        let console = Console::for_pixels(1024, 600, font);
        assert_eq!(console.width(), 128);
        assert_eq!(console.height(), 37);
    }

    #[test]
    fn palette_entry_index_is_masked() {
        let (mut console, _log) = recording_console(1, 1);
        console.set_palette_entry(0x13, Rgb::new(1, 2, 3));
        assert_eq!(console.palette()[3], Rgb::new(1, 2, 3));
    }
}
