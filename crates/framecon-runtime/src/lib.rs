#![forbid(unsafe_code)]

//! Framecon runtime.
//!
//! Ties a [`framecon_core::Console`] to a display [`Backend`]: the
//! [`FramePump`] owns the console, registers a render session as its
//! observer, translates input events into console mutations and presents
//! one frame per iteration.
//!
//! # Key Components
//!
//! - [`Backend`] - Surface creation, non-blocking event polling, present
//! - [`HeadlessBackend`] - Scripted in-memory backend for tests and the harness
//! - [`FramePump`] - The per-frame input/blink/present loop
//! - [`PumpConfig`] - Window size, pixel format, key handling and blink rate

pub mod backend;
pub mod config;
pub mod event;
pub mod pump;

pub use backend::{Backend, BackendError, HeadlessBackend};
pub use config::{DEFAULT_BLINK_INTERVAL, DEFAULT_HEIGHT, DEFAULT_WIDTH, PumpConfig};
pub use event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerButton, PointerButtons,
    PointerEvent, PointerEventKind, PointerState,
};
pub use pump::{FramePump, PumpError, PumpExit, SetupError};
