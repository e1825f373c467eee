#![forbid(unsafe_code)]

//! Windowing and input contract.
//!
//! A [`Backend`] owns the display: it creates the drawable surface once,
//! hands out pending input events without blocking, and shows a finished
//! frame. [`HeadlessBackend`] is the in-memory implementation used by tests
//! and the harness: a scripted event queue plus a [`SoftwareSurface`].

use std::collections::VecDeque;
use std::fmt;

use framecon_render::{PixelFormat, SoftwareSurface, Surface};

use crate::event::Event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No surface of the requested size and format could be created.
    SurfaceUnavailable {
        width: u32,
        height: u32,
        reason: String,
    },
    /// The event source went away.
    Disconnected,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceUnavailable {
                width,
                height,
                reason,
            } => write!(f, "unable to create {width}x{height} surface: {reason}"),
            Self::Disconnected => write!(f, "event source disconnected"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Display and input provider driven by the frame pump.
pub trait Backend {
    type Surface: Surface + 'static;

    /// Create the drawable surface. Called once, at attach.
    fn create_surface(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self::Surface, BackendError>;

    /// Next pending event, or `None` when the queue is empty. Never blocks.
    fn poll_event(&mut self) -> Result<Option<Event>, BackendError>;

    /// Show the finished frame.
    fn present(&mut self, surface: &mut Self::Surface);
}

/// In-memory backend with a scripted event queue.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    events: VecDeque<Event>,
    max_surface: Option<(u32, u32)>,
    disconnect_when_empty: bool,
    presents: u64,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `events` to be delivered in order.
    #[must_use]
    pub fn with_events(mut self, events: impl IntoIterator<Item = Event>) -> Self {
        self.events.extend(events);
        self
    }

    /// Refuse surfaces larger than `width × height`, like a display that
    /// cannot set the requested mode.
    #[must_use]
    pub fn with_max_surface(mut self, width: u32, height: u32) -> Self {
        self.max_surface = Some((width, height));
        self
    }

    /// Report [`BackendError::Disconnected`] once the script runs out.
    #[must_use]
    pub fn with_disconnect_when_empty(mut self, enabled: bool) -> Self {
        self.disconnect_when_empty = enabled;
        self
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Events not yet delivered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// Frames shown so far.
    #[must_use]
    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl Backend for HeadlessBackend {
    type Surface = SoftwareSurface;

    fn create_surface(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<SoftwareSurface, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::SurfaceUnavailable {
                width,
                height,
                reason: "zero-sized surface".to_string(),
            });
        }
        if let Some((max_w, max_h)) = self.max_surface
            && (width > max_w || height > max_h)
        {
            return Err(BackendError::SurfaceUnavailable {
                width,
                height,
                reason: format!("display limited to {max_w}x{max_h}"),
            });
        }
        Ok(SoftwareSurface::new(width, height, format))
    }

    fn poll_event(&mut self) -> Result<Option<Event>, BackendError> {
        match self.events.pop_front() {
            Some(event) => Ok(Some(event)),
            None if self.disconnect_when_empty => Err(BackendError::Disconnected),
            None => Ok(None),
        }
    }

    fn present(&mut self, surface: &mut SoftwareSurface) {
        surface.present(None);
        self.presents += 1;
    }
}
