#![forbid(unsafe_code)]

//! Headless session runner and frame reports for framecon.
//!
//! Drives a [`FramePump`] over a [`HeadlessBackend`] with a scripted key
//! sequence, then summarizes the run as a [`FrameReport`]: frame and
//! present counts, dispatch statistics and a deterministic hash of the
//! final framebuffer.
//!
//! # Quick Start
//!
//! ```ignore
//! use framecon_harness::{HarnessOptions, run_session};
//!
//! let report = run_session(&HarnessOptions::default().with_script("hello\n"))?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

use std::cell::Cell;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use framecon_core::{BitmapFont, ConsoleModel, FontError};
use framecon_render::{DispatchTrace, RenderConfig, SoftwareSurface, Surface};
use framecon_runtime::{
    Event, FramePump, HeadlessBackend, KeyCode, KeyEvent, PumpConfig, PumpError, PumpExit,
    SetupError,
};
use serde::{Deserialize, Serialize};

pub const REPORT_SCHEMA_VERSION: &str = "framecon-report-v1";
pub const FRAME_HASH_ALGO: &str = "fnv1a64";
const FNV64_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01B3;

/// Everything a headless run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessOptions {
    pub pump: PumpConfig,
    /// Raw font file (256 glyphs, MSB-first rows). Procedural font when unset.
    pub font_path: Option<PathBuf>,
    pub char_width: u16,
    pub char_height: u16,
    /// Text typed before the frames run; `'\n'` is Enter, `'\x08'` Backspace.
    pub script: String,
    /// Queue a quit after the script.
    pub quit_after_script: bool,
    /// Frames to run when no quit arrives.
    pub frames: u64,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            pump: PumpConfig::default(),
            font_path: None,
            char_width: 8,
            char_height: 16,
            script: String::new(),
            quit_after_script: false,
            frames: 60,
        }
    }
}

impl HarnessOptions {
    #[must_use]
    pub fn with_pump(mut self, pump: PumpConfig) -> Self {
        self.pump = pump;
        self
    }

    #[must_use]
    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_font_size(mut self, char_width: u16, char_height: u16) -> Self {
        self.char_width = char_width;
        self.char_height = char_height;
        self
    }

    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    #[must_use]
    pub fn with_quit_after_script(mut self, enabled: bool) -> Self {
        self.quit_after_script = enabled;
        self
    }

    #[must_use]
    pub fn with_frames(mut self, frames: u64) -> Self {
        self.frames = frames;
        self
    }
}

#[derive(Debug)]
pub enum HarnessError {
    /// The font file could not be read.
    FontIo { path: PathBuf, source: io::Error },
    Font(FontError),
    Setup(SetupError),
    Pump(PumpError),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontIo { path, source } => {
                write!(f, "failed to read font {}: {source}", path.display())
            }
            Self::Font(err) => write!(f, "invalid font: {err}"),
            Self::Setup(err) => write!(f, "setup failed: {err}"),
            Self::Pump(err) => write!(f, "run failed: {err}"),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FontIo { source, .. } => Some(source),
            Self::Font(err) => Some(err),
            Self::Setup(err) => Some(err),
            Self::Pump(err) => Some(err),
        }
    }
}

impl From<FontError> for HarnessError {
    fn from(err: FontError) -> Self {
        Self::Font(err)
    }
}

impl From<SetupError> for HarnessError {
    fn from(err: SetupError) -> Self {
        Self::Setup(err)
    }
}

impl From<PumpError> for HarnessError {
    fn from(err: PumpError) -> Self {
        Self::Pump(err)
    }
}

/// Summary of one headless run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReport {
    pub schema_version: String,
    pub cols: u16,
    pub rows: u16,
    pub width: u32,
    pub height: u32,
    pub char_width: u16,
    pub char_height: u16,
    /// `"quit"` or `"frame_limit"`.
    pub exit: String,
    pub frames: u64,
    pub presents: u64,
    pub notifications: u64,
    pub applied: u64,
    pub noops: u64,
    pub skipped: u64,
    /// Traces delivered to the dispatch hook, when tracing was enabled.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub traced: Option<u64>,
    pub hash_algo: String,
    /// Hex FNV-1a hash of the final framebuffer.
    pub frame_hash: String,
}

#[must_use]
fn fnv1a64_extend(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV64_PRIME);
    }
    hash
}

/// Deterministic hash over surface geometry, format and pixels.
#[must_use]
pub fn frame_hash(surface: &SoftwareSurface) -> u64 {
    let mut hash = FNV64_OFFSET_BASIS;
    hash = fnv1a64_extend(hash, &surface.width().to_le_bytes());
    hash = fnv1a64_extend(hash, &surface.height().to_le_bytes());
    hash = fnv1a64_extend(hash, &[surface.format().bits_per_pixel()]);
    for px in surface.snapshot() {
        hash = fnv1a64_extend(hash, &px.to_le_bytes());
    }
    hash
}

/// Translate script text into key events.
#[must_use]
pub fn script_events(script: &str) -> Vec<Event> {
    script
        .chars()
        .map(|c| {
            let code = match c {
                '\n' => KeyCode::Enter,
                '\x08' => KeyCode::Backspace,
                other => KeyCode::Char(other),
            };
            Event::Key(KeyEvent::new(code))
        })
        .collect()
}

/// Load the configured font, or generate the procedural placeholder.
pub fn load_font(options: &HarnessOptions) -> Result<BitmapFont, HarnessError> {
    let font = match &options.font_path {
        Some(path) => {
            let bytes = std::fs::read(path).map_err(|source| HarnessError::FontIo {
                path: path.clone(),
                source,
            })?;
            BitmapFont::from_raw(options.char_width, options.char_height, bytes)?
        }
        None => BitmapFont::procedural(options.char_width, options.char_height)?,
    };
    Ok(font)
}

/// Run one scripted headless session and summarize it.
pub fn run_session(options: &HarnessOptions) -> Result<FrameReport, HarnessError> {
    let font = load_font(options)?;
    let console = options.pump.console(font);

    let mut events = script_events(&options.script);
    if options.quit_after_script {
        events.push(Event::Quit);
    }
    let backend = HeadlessBackend::new().with_events(events);
    let mut pump = FramePump::attach(backend, console, options.pump)?;

    let traced = Rc::new(Cell::new(0u64));
    if options.pump.render.trace_dispatch {
        let counter = Rc::clone(&traced);
        pump.session()
            .borrow_mut()
            .set_trace_hook(Some(Box::new(move |trace: &DispatchTrace| {
                counter.set(counter.get() + 1);
                tracing::trace!(
                    seq = trace.seq,
                    kind = trace.change.kind(),
                    outcome = ?trace.outcome,
                    "dispatch"
                );
            })));
    }

    let exit = pump.run_frames(options.frames)?;
    tracing::info!(?exit, frames = pump.frames(), "session finished");

    let stats = pump.dispatch_stats();
    let session = pump.session().borrow();
    let ctx = session.context();
    let surface = session.surface().borrow();
    let console = pump.console();

    Ok(FrameReport {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        cols: console.width(),
        rows: console.height(),
        width: surface.width(),
        height: surface.height(),
        char_width: ctx.char_width(),
        char_height: ctx.char_height(),
        exit: match exit {
            PumpExit::Quit => "quit",
            PumpExit::FrameLimit => "frame_limit",
        }
        .to_string(),
        frames: pump.frames(),
        presents: pump.backend().presents(),
        notifications: stats.notifications,
        applied: stats.applied,
        noops: stats.noops,
        skipped: stats.skipped,
        traced: options
            .pump
            .render
            .trace_dispatch
            .then(|| traced.get()),
        hash_algo: FRAME_HASH_ALGO.to_string(),
        frame_hash: format!("{:016x}", frame_hash(&surface)),
    })
}

/// Render configuration with dispatch tracing switched on or off.
#[must_use]
pub fn render_config(trace_dispatch: bool) -> RenderConfig {
    RenderConfig::default().with_trace_dispatch(trace_dispatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecon_render::PixelFormat;

    #[test]
    fn fnv_matches_reference_vectors() {
        assert_eq!(fnv1a64_extend(FNV64_OFFSET_BASIS, b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a64_extend(FNV64_OFFSET_BASIS, b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn hash_depends_on_pixels() {
        let mut surface = SoftwareSurface::new(4, 4, PixelFormat::Argb8888);
        let blank = frame_hash(&surface);
        surface
            .fill_rect(framecon_render::PixelRect::new(1, 1, 1, 1), 0xFFFF_FFFF)
            .unwrap();
        assert_ne!(frame_hash(&surface), blank);
    }

    #[test]
    fn script_maps_control_characters() {
        let events = script_events("a\n\x08");
        assert_eq!(
            events,
            vec![
                Event::Key(KeyEvent::new(KeyCode::Char('a'))),
                Event::Key(KeyEvent::new(KeyCode::Enter)),
                Event::Key(KeyEvent::new(KeyCode::Backspace)),
            ]
        );
    }
}
