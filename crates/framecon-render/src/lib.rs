#![forbid(unsafe_code)]

//! Render kernel: glyph masks, palette mapping, cell drawing, and dispatch.
//!
//! The renderer turns [`framecon_core::Change`] notifications into pixel
//! operations on a lockable [`Surface`]:
//!
//! - [`GlyphCache`] expands the packed bitmap font into one byte per pixel.
//! - [`PaletteTable`] maps the 16 abstract colors to native pixel values.
//! - [`RenderContext`] owns both plus the cursor color, and draws cells and
//!   the cursor strip.
//! - [`RenderSession`] routes each notification to the context, in order,
//!   and is what gets registered as the console's observer.
//!
//! Draw failures (an unavailable lock) drop that one visual update and are
//! never surfaced upward; setup failures are returned from
//! [`RenderContext::attach`].

pub mod cell_renderer;
pub mod context;
pub mod dispatcher;
pub mod glyph_cache;
pub mod logging;
pub mod palette;
pub mod surface;
pub mod trace;

pub use cell_renderer::{CURSOR_HEIGHT, CURSOR_OFFSET_FROM_BOTTOM, DrawOutcome};
pub use context::{AttachError, RenderConfig, RenderContext};
pub use dispatcher::{
    DispatchOutcome, DispatchStats, RenderSession, SessionHandle, SessionObserver, exposed_rows,
};
pub use glyph_cache::{GlyphCache, GlyphCacheError};
pub use palette::PaletteTable;
pub use surface::{
    LockedSurface, PixelFormat, PixelRect, SoftwareSurface, Surface, SurfaceError, SurfaceHandle,
};
pub use trace::{DispatchTrace, TraceHook};

#[cfg(feature = "tracing")]
pub use logging::{debug, error, trace, warn};
