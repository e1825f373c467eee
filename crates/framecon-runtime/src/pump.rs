#![forbid(unsafe_code)]

//! Frame pump: input → console mutations → pixels → present.
//!
//! One iteration ("frame"):
//!
//! 1. Drain every pending backend event. `Quit` ends the loop on the spot;
//!    events queued behind it are left unprocessed. Pointer events only update
//!    [`PointerState`].
//! 2. Advance the cursor blink clock.
//! 3. Present the surface.
//!
//! Console mutations reach the surface synchronously through the registered
//! [`RenderSession`]; the pump itself never draws.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use framecon_core::{Console, ConsoleModel};
use framecon_render::{
    AttachError, DispatchStats, RenderContext, RenderSession, SessionHandle, SessionObserver,
    Surface,
};
use tracing::{debug, info, info_span, warn};

use crate::backend::{Backend, BackendError};
use crate::config::PumpConfig;
use crate::event::{Event, KeyCode, KeyEvent, KeyEventKind, PointerState};

/// Failure while bringing the pump up. Fatal: nothing is left running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// The backend could not create the drawable surface.
    Surface(BackendError),
    /// The renderer could not attach to the console.
    Attach(AttachError),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface(err) => write!(f, "surface setup failed: {err}"),
            Self::Attach(err) => write!(f, "renderer attach failed: {err}"),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Surface(err) => Some(err),
            Self::Attach(err) => Some(err),
        }
    }
}

impl From<AttachError> for SetupError {
    fn from(err: AttachError) -> Self {
        Self::Attach(err)
    }
}

/// Failure while running frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpError {
    Backend(BackendError),
}

impl fmt::Display for PumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "backend error: {err}"),
        }
    }
}

impl std::error::Error for PumpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
        }
    }
}

impl From<BackendError> for PumpError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

/// Why a run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// A quit event was received.
    Quit,
    /// The requested number of frames completed.
    FrameLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameStatus {
    Presented,
    Quit,
}

pub struct FramePump<B: Backend> {
    backend: B,
    console: Console,
    session: SessionHandle<B::Surface>,
    config: PumpConfig,
    attr_counter: u8,
    pointer: PointerState,
    frames: u64,
    attached: bool,
}

impl<B: Backend> FramePump<B> {
    /// Create the surface, attach a render session to `console`, register
    /// it as the console's observer and clear the screen.
    pub fn attach(mut backend: B, mut console: Console, config: PumpConfig) -> Result<Self, SetupError> {
        let _span = info_span!(
            "framecon.pump.attach",
            width = config.width,
            height = config.height
        )
        .entered();

        let surface = backend
            .create_surface(config.width, config.height, config.format)
            .map_err(SetupError::Surface)?;
        let format = surface.format();

        let needed_w = u32::from(console.width()) * u32::from(console.char_width());
        let needed_h = u32::from(console.height()) * u32::from(console.char_height());
        if needed_w > surface.width() || needed_h > surface.height() {
            warn!(
                needed_w,
                needed_h,
                surface_w = surface.width(),
                surface_h = surface.height(),
                "console larger than surface; edge cells will be clipped"
            );
        }

        let ctx = RenderContext::attach(&console, format)?;
        let session = RenderSession::new(ctx, Rc::new(RefCell::new(surface)))
            .with_config(config.render)
            .into_shared();
        console.set_observer(Some(SessionObserver::boxed(&session)));
        console.clear();

        info!(
            cols = console.width(),
            rows = console.height(),
            ?format,
            "frame pump attached"
        );
        Ok(Self {
            backend,
            console,
            session,
            config,
            attr_counter: 0,
            pointer: PointerState::default(),
            frames: 0,
            attached: true,
        })
    }

    /// Run until quit, or until the configured frame limit.
    pub fn run(&mut self) -> Result<PumpExit, PumpError> {
        let _span = info_span!("framecon.pump.run", frame_limit = ?self.config.frame_limit).entered();
        loop {
            if let Some(limit) = self.config.frame_limit
                && self.frames >= limit
            {
                info!(frames = self.frames, "frame limit reached");
                return Ok(PumpExit::FrameLimit);
            }
            if self.frame()? == FrameStatus::Quit {
                return Ok(PumpExit::Quit);
            }
        }
    }

    /// Run exactly `count` frames unless a quit arrives first.
    pub fn run_frames(&mut self, count: u64) -> Result<PumpExit, PumpError> {
        let _span = info_span!("framecon.pump.run_frames", count).entered();
        for _ in 0..count {
            if self.frame()? == FrameStatus::Quit {
                return Ok(PumpExit::Quit);
            }
        }
        Ok(PumpExit::FrameLimit)
    }

    /// Unregister the render session from the console.
    ///
    /// Idempotent; also runs on drop. After this, console mutations no
    /// longer touch the surface.
    pub fn shutdown(&mut self) {
        if !self.attached {
            return;
        }
        self.console.set_observer(None);
        self.attached = false;
        debug!(frames = self.frames, "frame pump detached");
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Mutable console access. Mutations still render while attached.
    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn session(&self) -> &SessionHandle<B::Surface> {
        &self.session
    }

    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Last pointer position (surface pixels) and held buttons.
    #[must_use]
    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    /// Frames presented so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn dispatch_stats(&self) -> DispatchStats {
        self.session.borrow().stats()
    }

    fn frame(&mut self) -> Result<FrameStatus, PumpError> {
        while let Some(event) = self.backend.poll_event()? {
            match event {
                Event::Quit => {
                    info!(frames = self.frames, "quit received");
                    return Ok(FrameStatus::Quit);
                }
                Event::Key(key) => self.handle_key(key),
                Event::Pointer(pointer) => self.pointer.apply(&pointer),
            }
        }

        self.console.blink_cursor();
        self.present();
        self.frames += 1;
        Ok(FrameStatus::Presented)
    }

    fn present(&mut self) {
        let session = self.session.borrow();
        match session.surface().try_borrow_mut() {
            Ok(mut surface) => self.backend.present(&mut surface),
            Err(_) => warn!(frame = self.frames, "surface busy; frame not presented"),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if let Some(byte) = key.printable_byte() {
            self.console.print_char(byte);
            if self.config.cycle_attribute {
                self.console.set_attribute(self.attr_counter);
                self.attr_counter = self.attr_counter.wrapping_add(1);
            }
            return;
        }

        let (x, y) = (self.console.cursor_x(), self.console.cursor_y());
        match key.code {
            KeyCode::Left => self.console.cursor_goto_xy(x.saturating_sub(1), y),
            KeyCode::Right => self.console.cursor_goto_xy(x.saturating_add(1), y),
            KeyCode::Up => self.console.cursor_goto_xy(x, y.saturating_sub(1)),
            KeyCode::Down => self.console.cursor_goto_xy(x, y.saturating_add(1)),
            KeyCode::Enter => self.console.print_char(b'\n'),
            KeyCode::Backspace => self.console.print_char(0x08),
            _ => {}
        }
    }
}

impl<B: Backend> Drop for FramePump<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<B: Backend> fmt::Debug for FramePump<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramePump")
            .field("config", &self.config)
            .field("frames", &self.frames)
            .field("attached", &self.attached)
            .finish_non_exhaustive()
    }
}
