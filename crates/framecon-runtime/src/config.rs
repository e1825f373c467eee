#![forbid(unsafe_code)]

//! Frame pump configuration.

use framecon_core::{BitmapFont, Console, ConsoleConfig};
use framecon_render::{PixelFormat, RenderConfig};

/// Default surface width in pixels.
pub const DEFAULT_WIDTH: u32 = 1024;
/// Default surface height in pixels.
pub const DEFAULT_HEIGHT: u32 = 600;
/// Frames between cursor blink flips.
pub const DEFAULT_BLINK_INTERVAL: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    pub format: PixelFormat,
    /// Advance the console attribute after every printed key.
    pub cycle_attribute: bool,
    /// Frames between cursor blink flips; `0` disables blinking.
    pub blink_interval_frames: u32,
    /// Stop [`FramePump::run`](crate::FramePump::run) after this many frames.
    pub frame_limit: Option<u64>,
    pub render: RenderConfig,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            format: PixelFormat::default(),
            cycle_attribute: true,
            blink_interval_frames: DEFAULT_BLINK_INTERVAL,
            frame_limit: None,
            render: RenderConfig::default(),
        }
    }
}

impl PumpConfig {
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_cycle_attribute(mut self, enabled: bool) -> Self {
        self.cycle_attribute = enabled;
        self
    }

    #[must_use]
    pub fn with_blink_interval_frames(mut self, frames: u32) -> Self {
        self.blink_interval_frames = frames;
        self
    }

    #[must_use]
    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    #[must_use]
    pub fn with_render_config(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Largest console that fits the configured surface with `font`,
    /// blinking at the configured interval.
    #[must_use]
    pub fn console(&self, font: BitmapFont) -> Console {
        let cols = self.width / u32::from(font.char_width());
        let rows = self.height / u32::from(font.char_height());
        let config = ConsoleConfig::default().with_blink_interval(self.blink_interval_frames);
        Console::with_config(
            u16::try_from(cols).unwrap_or(u16::MAX),
            u16::try_from(rows).unwrap_or(u16::MAX),
            font,
            config,
        )
    }
}
