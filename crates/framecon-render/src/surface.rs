#![forbid(unsafe_code)]

//! Drawable surface contract and an in-memory implementation.
//!
//! A [`Surface`] is owned by the windowing layer. The renderer only borrows
//! it, and only touches pixels through a [`LockedSurface`] guard: the lock is
//! taken on [`LockedSurface::acquire`] and released when the guard drops, on
//! every exit path. Pixels are stored one `u32` per pixel in the surface's
//! native [`PixelFormat`], `pitch` pixels per row.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use framecon_core::Rgb;

/// Shared handle through which the render session reaches the surface.
pub type SurfaceHandle<S> = Rc<RefCell<S>>;

/// Native pixel encoding of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// `0xAARRGGBB`, alpha forced opaque.
    #[default]
    Argb8888,
    /// `0xRRGGBBAA`, alpha forced opaque.
    Rgba8888,
    /// `0xBBGGRRAA`, alpha forced opaque.
    Bgra8888,
    /// 5-6-5 packed into the low 16 bits.
    Rgb565,
}

impl PixelFormat {
    /// Encode an RGB triple as a native pixel value.
    #[must_use]
    pub const fn map_rgb(self, rgb: Rgb) -> u32 {
        let (r, g, b) = (rgb.r as u32, rgb.g as u32, rgb.b as u32);
        match self {
            Self::Argb8888 => 0xFF00_0000 | (r << 16) | (g << 8) | b,
            Self::Rgba8888 => (r << 24) | (g << 16) | (b << 8) | 0xFF,
            Self::Bgra8888 => (b << 24) | (g << 16) | (r << 8) | 0xFF,
            Self::Rgb565 => ((r >> 3) << 11) | ((g >> 2) << 5) | (b >> 3),
        }
    }

    /// Decode a native pixel value back to RGB (lossy for 565).
    #[cfg(test)]
    const fn to_rgb(self, pixel: u32) -> Rgb {
        match self {
            Self::Argb8888 => Rgb::new((pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8),
            Self::Rgba8888 => Rgb::new((pixel >> 24) as u8, (pixel >> 16) as u8, (pixel >> 8) as u8),
            Self::Bgra8888 => Rgb::new((pixel >> 8) as u8, (pixel >> 16) as u8, (pixel >> 24) as u8),
            Self::Rgb565 => {
                let r = ((pixel >> 11) & 0x1F) as u8;
                let g = ((pixel >> 5) & 0x3F) as u8;
                let b = (pixel & 0x1F) as u8;
                Rgb::new((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
            }
        }
    }

    #[must_use]
    pub const fn bits_per_pixel(self) -> u8 {
        match self {
            Self::Rgb565 => 16,
            _ => 32,
        }
    }
}

/// Pixel-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Intersect with a `width × height` surface. `None` if nothing remains.
    #[must_use]
    pub fn clip(self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.w.min(width - self.x);
        let h = self.h.min(height - self.y);
        let clipped = Self::new(self.x, self.y, w, h);
        (!clipped.is_empty()).then_some(clipped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceError {
    /// The pixel lock could not be acquired for this call.
    LockUnavailable,
    /// The surface is held elsewhere on this thread (re-entrant dispatch).
    Busy,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LockUnavailable => write!(f, "surface pixel lock unavailable"),
            Self::Busy => write!(f, "surface already borrowed"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// A lockable framebuffer.
///
/// Implementors provide locking and raw pixel storage; block copy and fill
/// have default implementations on top of [`LockedSurface`].
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> PixelFormat;
    /// Pixels per row in [`pixels_mut`](Self::pixels_mut). At least `width`.
    fn pitch(&self) -> usize;

    /// Acquire direct pixel access.
    fn lock(&mut self) -> Result<(), SurfaceError>;
    /// Release direct pixel access.
    fn unlock(&mut self);
    /// Backing pixels. Only meaningful while locked.
    fn pixels_mut(&mut self) -> &mut [u32];

    /// Show `area` (or everything, for `None`) to the user.
    fn present(&mut self, area: Option<PixelRect>);

    /// Copy `src` to `(dst_x, dst_y)` within this surface.
    ///
    /// Source and destination may overlap; the result is as if the source
    /// had been copied out in full before writing.
    fn blit_within(&mut self, src: PixelRect, dst_x: u32, dst_y: u32) -> Result<(), SurfaceError> {
        let mut locked = LockedSurface::acquire(self)?;
        locked.blit_within(src, dst_x, dst_y);
        Ok(())
    }

    /// Fill `rect` with a native pixel value.
    fn fill_rect(&mut self, rect: PixelRect, color: u32) -> Result<(), SurfaceError> {
        let mut locked = LockedSurface::acquire(self)?;
        locked.fill_rect(rect, color);
        Ok(())
    }
}

/// Scoped pixel lock. Unlocks on drop.
pub struct LockedSurface<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: Surface + ?Sized> LockedSurface<'a, S> {
    pub fn acquire(surface: &'a mut S) -> Result<Self, SurfaceError> {
        surface.lock()?;
        Ok(Self { surface })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    #[must_use]
    pub fn pitch(&self) -> usize {
        self.surface.pitch()
    }

    /// `len` pixels of row `y` starting at `x`, clipped to the surface width.
    pub fn span_mut(&mut self, x: u32, y: u32, len: u32) -> &mut [u32] {
        let (width, height, pitch) = (self.width(), self.height(), self.pitch());
        if x >= width || y >= height {
            return &mut [];
        }
        let len = len.min(width - x) as usize;
        let start = y as usize * pitch + x as usize;
        &mut self.surface.pixels_mut()[start..start + len]
    }

    /// Fill the clipped rectangle with `color`.
    pub fn fill_rect(&mut self, rect: PixelRect, color: u32) {
        let Some(rect) = rect.clip(self.width(), self.height()) else {
            return;
        };
        for y in rect.y..rect.y + rect.h {
            self.span_mut(rect.x, y, rect.w).fill(color);
        }
    }

    /// Overlap-safe block copy, clipped to the surface on both ends.
    pub fn blit_within(&mut self, src: PixelRect, dst_x: u32, dst_y: u32) {
        let (width, height, pitch) = (self.width(), self.height(), self.pitch());
        let Some(src) = src.clip(width, height) else {
            return;
        };
        if dst_x >= width || dst_y >= height {
            return;
        }
        let w = src.w.min(width - dst_x) as usize;
        let h = src.h.min(height - dst_y);
        let pixels = self.surface.pixels_mut();

        let copy_row = |pixels: &mut [u32], row: u32| {
            let from = (src.y + row) as usize * pitch + src.x as usize;
            let to = (dst_y + row) as usize * pitch + dst_x as usize;
            pixels.copy_within(from..from + w, to);
        };
        // Moving down must walk bottom-up so unread source rows survive.
        if dst_y > src.y {
            for row in (0..h).rev() {
                copy_row(pixels, row);
            }
        } else {
            for row in 0..h {
                copy_row(pixels, row);
            }
        }
    }
}

impl<S: Surface + ?Sized> Drop for LockedSurface<'_, S> {
    fn drop(&mut self) {
        self.surface.unlock();
    }
}

/// Heap-backed surface used by headless backends, tests, and benches.
#[derive(Debug, Clone)]
pub struct SoftwareSurface {
    width: u32,
    height: u32,
    pitch: usize,
    format: PixelFormat,
    pixels: Vec<u32>,
    locked: bool,
    lock_count: u64,
    failing_locks: u32,
    presents: u64,
    last_present: Option<Option<PixelRect>>,
}

impl SoftwareSurface {
    #[must_use]
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self::with_pitch(width, height, width as usize, format)
    }

    /// Surface with row padding: `pitch` is clamped to at least `width`.
    #[must_use]
    pub fn with_pitch(width: u32, height: u32, pitch: usize, format: PixelFormat) -> Self {
        let pitch = pitch.max(width as usize);
        Self {
            width,
            height,
            pitch,
            format,
            pixels: vec![0; pitch * height as usize],
            locked: false,
            lock_count: 0,
            failing_locks: 0,
            presents: 0,
            last_present: None,
        }
    }

    /// Make the next `count` lock attempts fail.
    pub fn fail_next_locks(&mut self, count: u32) {
        self.failing_locks = count;
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.pitch + x as usize])
        } else {
            None
        }
    }

    /// Copy of the visible pixels of one rectangle, row-major.
    #[must_use]
    pub fn read_rect(&self, rect: PixelRect) -> Vec<u32> {
        let Some(rect) = rect.clip(self.width, self.height) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity((rect.w * rect.h) as usize);
        for y in rect.y..rect.y + rect.h {
            let start = y as usize * self.pitch + rect.x as usize;
            out.extend_from_slice(&self.pixels[start..start + rect.w as usize]);
        }
        out
    }

    /// All visible pixels, row-major, without pitch padding.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u32> {
        self.read_rect(PixelRect::new(0, 0, self.width, self.height))
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Successful lock acquisitions so far.
    #[must_use]
    pub fn lock_count(&self) -> u64 {
        self.lock_count
    }

    #[must_use]
    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Area passed to the most recent [`Surface::present`], if any.
    #[must_use]
    pub fn last_present(&self) -> Option<Option<PixelRect>> {
        self.last_present
    }
}

impl Surface for SoftwareSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn pitch(&self) -> usize {
        self.pitch
    }

    fn lock(&mut self) -> Result<(), SurfaceError> {
        if self.locked {
            return Err(SurfaceError::LockUnavailable);
        }
        if self.failing_locks > 0 {
            self.failing_locks -= 1;
            return Err(SurfaceError::LockUnavailable);
        }
        self.locked = true;
        self.lock_count += 1;
        Ok(())
    }

    fn unlock(&mut self) {
        self.locked = false;
    }

    fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    fn present(&mut self, area: Option<PixelRect>) {
        self.presents += 1;
        self.last_present = Some(area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(width: u32, height: u32) -> SoftwareSurface {
        let mut surface = SoftwareSurface::new(width, height, PixelFormat::Argb8888);
        let mut locked = LockedSurface::acquire(&mut surface).unwrap();
        for y in 0..height {
            for (x, px) in locked.span_mut(0, y, width).iter_mut().enumerate() {
                *px = y * 100 + x as u32;
            }
        }
        drop(locked);
        surface
    }

    #[test]
    fn map_rgb_per_format() {
        let rgb = Rgb::new(0x12, 0x34, 0x56);
        assert_eq!(PixelFormat::Argb8888.map_rgb(rgb), 0xFF12_3456);
        assert_eq!(PixelFormat::Rgba8888.map_rgb(rgb), 0x1234_56FF);
        assert_eq!(PixelFormat::Bgra8888.map_rgb(rgb), 0x5634_12FF);
        assert_eq!(PixelFormat::Rgb565.map_rgb(Rgb::WHITE), 0xFFFF);
        assert_eq!(PixelFormat::Rgb565.to_rgb(0xFFFF), Rgb::WHITE);
        for format in [
            PixelFormat::Argb8888,
            PixelFormat::Rgba8888,
            PixelFormat::Bgra8888,
        ] {
            assert_eq!(format.to_rgb(format.map_rgb(rgb)), rgb);
        }
    }

    #[test]
    fn clip_trims_and_rejects() {
        assert_eq!(
            PixelRect::new(8, 2, 10, 10).clip(10, 5),
            Some(PixelRect::new(8, 2, 2, 3))
        );
        assert_eq!(PixelRect::new(10, 0, 1, 1).clip(10, 5), None);
        assert_eq!(PixelRect::new(0, 0, 0, 4).clip(10, 5), None);
    }

    #[test]
    fn guard_unlocks_on_drop() {
        let mut surface = SoftwareSurface::new(2, 2, PixelFormat::Argb8888);
        {
            let _locked = LockedSurface::acquire(&mut surface).unwrap();
        }
        assert!(!surface.is_locked());
        assert_eq!(surface.lock_count(), 1);
    }

    #[test]
    fn injected_lock_failures_are_consumed() {
        let mut surface = SoftwareSurface::new(2, 2, PixelFormat::Argb8888);
        surface.fail_next_locks(1);
        assert_eq!(
            surface.fill_rect(PixelRect::new(0, 0, 2, 2), 7),
            Err(SurfaceError::LockUnavailable)
        );
        assert_eq!(surface.pixel(0, 0), Some(0));
        surface.fill_rect(PixelRect::new(0, 0, 2, 2), 7).unwrap();
        assert_eq!(surface.snapshot(), vec![7; 4]);
    }

    #[test]
    fn blit_up_with_overlap_matches_full_copy() {
        let mut surface = numbered(3, 6);
        let before = surface.snapshot();
        surface.blit_within(PixelRect::new(0, 2, 3, 4), 0, 0).unwrap();
        assert_eq!(surface.read_rect(PixelRect::new(0, 0, 3, 4)), &before[6..18]);
    }

    #[test]
    fn blit_down_with_overlap_matches_full_copy() {
        let mut surface = numbered(3, 6);
        let before = surface.snapshot();
        surface.blit_within(PixelRect::new(0, 0, 3, 4), 0, 2).unwrap();
        assert_eq!(surface.read_rect(PixelRect::new(0, 2, 3, 4)), &before[0..12]);
    }

    #[test]
    fn pitch_padding_is_not_visible() {
        let mut surface = SoftwareSurface::with_pitch(2, 2, 5, PixelFormat::Argb8888);
        surface.fill_rect(PixelRect::new(0, 0, 9, 9), 3).unwrap();
        assert_eq!(surface.snapshot(), vec![3; 4]);
        assert_eq!(surface.pitch(), 5);
    }

    #[test]
    fn present_is_recorded() {
        let mut surface = SoftwareSurface::new(1, 1, PixelFormat::Argb8888);
        assert_eq!(surface.last_present(), None);
        surface.present(None);
        assert_eq!(surface.presents(), 1);
        assert_eq!(surface.last_present(), Some(None));
    }
}
