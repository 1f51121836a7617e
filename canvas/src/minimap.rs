//! Minimap: a small, throttled overview of the whole bitmap.
//!
//! The overview is resampled from the bitmap only when ink changed and the
//! refresh interval elapsed, since the bitmap can be large. The viewport
//! indicator is recomputed on every query from the current viewport and is
//! always clamped to the minimap's own square.

#[cfg(test)]
#[path = "minimap_test.rs"]
mod minimap_test;

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::camera::{Point, Rect, Viewport};
use crate::consts::{MINIMAP_REFRESH_MS, MINIMAP_SIZE};
use crate::raster::RasterSurface;

#[derive(Debug, Clone)]
pub struct Minimap {
    size: u32,
    interval_ms: f64,
    image: RgbaImage,
    /// Minimap pixels per world unit.
    scale: f64,
    /// World position of the overview's top-left corner.
    origin: Point,
    dirty: bool,
    last_refresh_ms: Option<f64>,
}

impl Default for Minimap {
    fn default() -> Self {
        Self::new(MINIMAP_SIZE, MINIMAP_REFRESH_MS)
    }
}

impl Minimap {
    #[must_use]
    pub fn new(size: u32, interval_ms: f64) -> Self {
        let size = size.max(1);
        Self {
            size,
            interval_ms: interval_ms.max(0.0),
            image: RgbaImage::new(size, size),
            scale: 1.0,
            origin: Point::new(0.0, 0.0),
            dirty: true,
            last_refresh_ms: None,
        }
    }

    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The most recent overview. Its dimensions follow the bitmap's aspect ratio.
    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record that the bitmap changed since the last resample.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Resample if the bitmap changed and the interval elapsed. Returns true
    /// if the overview was rebuilt.
    pub fn maybe_refresh(&mut self, surface: &RasterSurface, now_ms: f64) -> bool {
        if !self.dirty {
            return false;
        }
        if self.last_refresh_ms.is_some_and(|t| now_ms - t < self.interval_ms) {
            return false;
        }
        self.force_refresh(surface, now_ms);
        true
    }

    /// Resample now, ignoring the dirty flag and the interval.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn force_refresh(&mut self, surface: &RasterSurface, now_ms: f64) {
        let longest = surface.width().max(surface.height()).max(1);
        self.scale = f64::from(self.size) / f64::from(longest);
        let w = ((f64::from(surface.width()) * self.scale).round() as u32).clamp(1, self.size);
        let h = ((f64::from(surface.height()) * self.scale).round() as u32).clamp(1, self.size);
        self.image = imageops::resize(surface.image(), w, h, FilterType::Triangle);
        let world = surface.world_rect();
        self.origin = Point::new(world.x, world.y);
        self.dirty = false;
        self.last_refresh_ms = Some(now_ms);
        log::debug!("minimap refreshed at {w}x{h}, scale {:.4}", self.scale);
    }

    /// Visible area of `viewport` in minimap pixels, clamped to the minimap.
    #[must_use]
    pub fn indicator(&self, viewport: &Viewport, screen_width: f64, screen_height: f64) -> Rect {
        let world = viewport.visible_world_rect(screen_width, screen_height);
        let limit = f64::from(self.size);
        let (left, top) = (world.x - self.origin.x, world.y - self.origin.y);
        let x0 = (left * self.scale).clamp(0.0, limit);
        let y0 = (top * self.scale).clamp(0.0, limit);
        let x1 = ((left + world.width) * self.scale).clamp(0.0, limit);
        let y1 = ((top + world.height) * self.scale).clamp(0.0, limit);
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// World point under a minimap-local position.
    #[must_use]
    pub fn to_world(&self, local: Point) -> Point {
        Point::new(self.origin.x + local.x / self.scale, self.origin.y + local.y / self.scale)
    }

    /// Whether a minimap-local position falls on the minimap.
    #[must_use]
    pub fn contains(&self, local: Point) -> bool {
        Rect::new(0.0, 0.0, f64::from(self.size), f64::from(self.size)).contains_with_margin(local, 0.0)
    }
}
