#![forbid(unsafe_code)]

//! Update dispatcher: change notifications → pixel operations.
//!
//! | Notification | Pixels |
//! |---|---|
//! | `CharWritten` | draw the cell |
//! | `RowsChanged` | nothing |
//! | `ScrollRegion` | self-blit, fill exposed rows with background, present |
//! | `CursorVisibilityChanged` | draw cursor, or repaint the cursor cell from the model |
//! | `CursorMoved` | repaint the old cell from the model, then draw the cursor at the new one |
//!
//! Every notification is applied on arrival, in order, with no coalescing.
//! A step that cannot lock the surface is dropped and the notification is
//! reported as skipped; it is never retried.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::ops::Range;
use std::rc::Rc;

use framecon_core::{Change, ConsoleModel, ConsoleObserver};

use crate::cell_renderer::DrawOutcome;
use crate::context::{RenderConfig, RenderContext};
use crate::glyph_cache::GlyphCacheError;
use crate::surface::{PixelRect, Surface, SurfaceError, SurfaceHandle};
use crate::trace::{DispatchTrace, TraceHook};

/// Result of applying one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Pixels were written.
    Applied,
    /// Nothing needed drawing (hint notification, hidden cursor, off-surface).
    NoOp,
    /// At least one step was dropped because the surface was unavailable.
    Skipped(SurfaceError),
}

impl DispatchOutcome {
    /// Combine two step outcomes; a skip dominates, then a write.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Skipped(err), _) | (_, Self::Skipped(err)) => Self::Skipped(err),
            (Self::Applied, _) | (_, Self::Applied) => Self::Applied,
            _ => Self::NoOp,
        }
    }
}

impl From<DrawOutcome> for DispatchOutcome {
    fn from(outcome: DrawOutcome) -> Self {
        match outcome {
            DrawOutcome::Drawn => Self::Applied,
            DrawOutcome::Clipped | DrawOutcome::Hidden => Self::NoOp,
            DrawOutcome::Skipped(err) => Self::Skipped(err),
        }
    }
}

/// Running totals for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub notifications: u64,
    pub applied: u64,
    pub noops: u64,
    pub skipped: u64,
}

impl DispatchStats {
    fn record(&mut self, outcome: DispatchOutcome) {
        self.notifications += 1;
        match outcome {
            DispatchOutcome::Applied => self.applied += 1,
            DispatchOutcome::NoOp => self.noops += 1,
            DispatchOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Character rows left stale after moving `lines` rows from `y2` to `y1`,
/// clipped to `height`.
///
/// This is the part of the source band not covered by the destination band.
#[must_use]
pub fn exposed_rows(y1: u16, y2: u16, lines: u16, height: u16) -> Option<Range<u16>> {
    let (start, end) = match y2.cmp(&y1) {
        Ordering::Greater => (y2.max(y1.saturating_add(lines)), y2.saturating_add(lines)),
        Ordering::Less => (y2, y1.min(y2.saturating_add(lines))),
        Ordering::Equal => return None,
    };
    let end = end.min(height);
    (start < end).then_some(start..end)
}

/// Render context bound to a surface; the console's registered observer.
pub struct RenderSession<S: Surface> {
    ctx: RenderContext,
    surface: SurfaceHandle<S>,
    config: RenderConfig,
    hook: Option<TraceHook>,
    seq: u64,
    stats: DispatchStats,
}

/// Shared session, so the owner can re-sync it while it stays registered.
pub type SessionHandle<S> = Rc<RefCell<RenderSession<S>>>;

impl<S: Surface> RenderSession<S> {
    pub fn new(ctx: RenderContext, surface: SurfaceHandle<S>) -> Self {
        Self {
            ctx,
            surface,
            config: RenderConfig::default(),
            hook: None,
            seq: 0,
            stats: DispatchStats::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_trace_hook(mut self, hook: TraceHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn set_trace_hook(&mut self, hook: Option<TraceHook>) {
        self.hook = hook;
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn surface(&self) -> &SurfaceHandle<S> {
        &self.surface
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Re-read palette and font from `model`.
    pub fn resync(&mut self, model: &dyn ConsoleModel) -> Result<(), GlyphCacheError> {
        self.ctx.sync_palette(model);
        self.ctx.rebuild_glyphs(model)
    }

    /// Apply one notification to the surface.
    pub fn dispatch(&mut self, model: &dyn ConsoleModel, change: &Change) -> DispatchOutcome {
        let outcome = match self.surface.try_borrow_mut() {
            Ok(mut surface) => apply(&self.ctx, model, &mut *surface, change),
            Err(_) => DispatchOutcome::Skipped(SurfaceError::Busy),
        };
        self.seq += 1;
        self.stats.record(outcome);
        crate::trace!(seq = self.seq, kind = change.kind(), ?outcome, "dispatch");

        if self.config.trace_dispatch
            && let Some(hook) = self.hook.as_mut()
        {
            hook(&DispatchTrace {
                seq: self.seq,
                change: *change,
                outcome,
            });
        }
        outcome
    }

    #[must_use]
    pub fn into_shared(self) -> SessionHandle<S> {
        Rc::new(RefCell::new(self))
    }
}

impl<S: Surface> ConsoleObserver for RenderSession<S> {
    fn on_change(&mut self, model: &dyn ConsoleModel, change: &Change) {
        self.dispatch(model, change);
    }
}

/// Observer that forwards to a shared [`RenderSession`].
pub struct SessionObserver<S: Surface> {
    session: SessionHandle<S>,
}

impl<S: Surface + 'static> SessionObserver<S> {
    pub fn new(session: &SessionHandle<S>) -> Self {
        Self {
            session: Rc::clone(session),
        }
    }

    /// Boxed, ready for `Console::set_observer`.
    #[must_use]
    pub fn boxed(session: &SessionHandle<S>) -> Box<dyn ConsoleObserver> {
        Box::new(Self::new(session))
    }
}

impl<S: Surface> ConsoleObserver for SessionObserver<S> {
    fn on_change(&mut self, model: &dyn ConsoleModel, change: &Change) {
        match self.session.try_borrow_mut() {
            Ok(mut session) => {
                session.dispatch(model, change);
            }
            Err(_) => {
                crate::warn!(kind = change.kind(), "session busy; notification dropped");
            }
        }
    }
}

fn apply<S: Surface + ?Sized>(
    ctx: &RenderContext,
    model: &dyn ConsoleModel,
    surface: &mut S,
    change: &Change,
) -> DispatchOutcome {
    match *change {
        Change::CharWritten { x, y, glyph, attr } => {
            ctx.draw_cell(surface, x, y, glyph, attr).into()
        }
        Change::RowsChanged => DispatchOutcome::NoOp,
        Change::ScrollRegion { y1, y2, lines } => scroll(ctx, model, surface, y1, y2, lines),
        Change::CursorVisibilityChanged { visible } => {
            let (x, y) = (model.cursor_x(), model.cursor_y());
            if visible {
                ctx.draw_cursor(model, surface, x, y).into()
            } else {
                repaint(ctx, model, surface, x, y).into()
            }
        }
        Change::CursorMoved {
            from_x,
            from_y,
            to_visible,
        } => {
            // Erase first: when old == new the cursor must survive.
            let erased = DispatchOutcome::from(repaint(ctx, model, surface, from_x, from_y));
            if !to_visible {
                return erased;
            }
            let (x, y) = (model.cursor_x(), model.cursor_y());
            erased.and(ctx.draw_cursor(model, surface, x, y).into())
        }
    }
}

/// Redraw a cell from the model's current content.
fn repaint<S: Surface + ?Sized>(
    ctx: &RenderContext,
    model: &dyn ConsoleModel,
    surface: &mut S,
    x: u16,
    y: u16,
) -> DrawOutcome {
    ctx.draw_cell(surface, x, y, model.character_at(x, y), model.attribute_at(x, y))
}

fn scroll<S: Surface + ?Sized>(
    ctx: &RenderContext,
    model: &dyn ConsoleModel,
    surface: &mut S,
    y1: u16,
    y2: u16,
    lines: u16,
) -> DispatchOutcome {
    let ch = u32::from(ctx.char_height());
    let width_px = u32::from(model.width()) * u32::from(ctx.char_width());

    if lines > 0 {
        let src = PixelRect::new(0, u32::from(y2) * ch, width_px, u32::from(lines) * ch);
        if let Err(err) = surface.blit_within(src, 0, u32::from(y1) * ch) {
            crate::debug!(y1, y2, lines, %err, "scroll blit skipped");
            return DispatchOutcome::Skipped(err);
        }
    }

    if let Some(rows) = exposed_rows(y1, y2, lines, model.height()) {
        let fill = PixelRect::new(
            0,
            u32::from(rows.start) * ch,
            width_px,
            u32::from(rows.end - rows.start) * ch,
        );
        let color = ctx
            .palette
            .background_color_of(model.background_color_index());
        if let Err(err) = surface.fill_rect(fill, color) {
            crate::debug!(y1, y2, lines, %err, "scroll fill skipped");
            return DispatchOutcome::Skipped(err);
        }
    }

    surface.present(None);
    DispatchOutcome::Applied
}
