#![forbid(unsafe_code)]

//! Host-agnostic character-cell console model.
//!
//! `framecon-core` is the data side of framecon. It owns the vocabulary shared
//! by the console and whatever draws it, without any pixel or window
//! dependencies.
//!
//! # Primary responsibilities
//!
//! - **Cell / Attribute**: glyph code + packed foreground/background nibbles.
//! - **Font**: fixed-size monochrome bitmap glyphs, rows packed MSB-first.
//! - **Model**: the read-only [`ConsoleModel`] contract, the [`Change`]
//!   notification enum, and the [`ConsoleObserver`] registration seam.
//! - **Console**: a reference in-memory model (grid, cursor, palette, blink)
//!   that emits one notification per affected region.
//!
//! # Design principles
//!
//! - **Synchronous**: notifications are delivered in-line, in order, on the
//!   stack of the mutation that produced them. Nothing is queued.
//! - **Deterministic**: identical call sequences produce identical
//!   notification streams.
//! - **`#![forbid(unsafe_code)]`**: safety enforced at compile time.

pub mod cell;
pub mod console;
pub mod font;
pub mod grid;
pub mod logging;
pub mod model;

pub use cell::{Attribute, Cell, DEFAULT_PALETTE, PALETTE_SIZE, Palette, Rgb};
pub use console::{Console, ConsoleConfig};
pub use font::{BitmapFont, FontError, GLYPH_COUNT};
pub use grid::Grid;
pub use model::{Change, ConsoleModel, ConsoleObserver};

#[cfg(feature = "tracing")]
pub use logging::{debug, trace, warn};
