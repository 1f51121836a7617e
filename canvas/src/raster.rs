//! Raster surface: the single full-resolution bitmap holding committed ink.
//!
//! One world unit is one bitmap pixel. The bitmap starts at world `(0, 0)`
//! with the screen's size and grows in whichever direction a stroke reaches
//! past it, so its top-left pixel can sit at a negative world origin. Pixels
//! are straight-alpha RGBA8, transparent where nothing has been drawn.
//!
//! Strokes are painted through a [`StrokeLayer`] that remembers the pixels
//! under the stroke and the highest coverage each pixel has received so far.
//! Every stamp recomputes touched pixels from that base, so a stroke is
//! composited once per pixel no matter how many of its segments overlap,
//! while the bitmap still updates on every pointer move.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use std::io::Cursor;
use std::sync::Arc;

use base64::Engine as _;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, Rgba, RgbaImage, imageops};
use serde::{Deserialize, Serialize};

use crate::camera::{Point, Rect, Viewport};
use crate::consts::{BITMAP_GROW_STEP, MAX_BITMAP_SIDE};
use crate::error::CanvasError;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (the `#` is optional).
    #[must_use]
    pub fn parse_hex(raw: &str) -> Option<Color> {
        let hex = raw.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => Some(Color::new(hex_byte(&hex[0..2])?, hex_byte(&hex[2..4])?, hex_byte(&hex[4..6])?)),
            3 => {
                let r = hex_byte(&hex[0..1])?;
                let g = hex_byte(&hex[1..2])?;
                let b = hex_byte(&hex[2..3])?;
                Some(Color::new(r * 17, g * 17, b * 17))
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn opaque_pixel(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

fn hex_byte(s: &str) -> Option<u8> {
    match u8::from_str_radix(s, 16) {
        Ok(v) => Some(v),
        Err(_) => None,
    }
}

/// Pixel blending rule used while painting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeMode {
    /// Normal ink laid over existing pixels.
    #[default]
    SourceOver,
    /// Erase: removes existing alpha where painted.
    DestinationOut,
    /// Highlighter: darkens by multiplying with existing color.
    Multiply,
}

/// Color, opacity and blending for a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub opacity: f64,
    pub composite: CompositeMode,
}

/// PNG-encoded copy of the whole bitmap and where it sits in the world.
/// Cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    origin: (i64, i64),
    width: u32,
    height: u32,
    png: Arc<[u8]>,
}

impl Snapshot {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// World position of the snapshot's top-left pixel.
    #[must_use]
    pub fn origin(&self) -> (i64, i64) {
        self.origin
    }

    /// Bytes retained for this entry.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.png.len()
    }

    /// The pixels this snapshot holds.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Decode`] if the stored PNG cannot be read.
    pub fn decode(&self) -> Result<RgbaImage, CanvasError> {
        let image = image::load_from_memory_with_format(&self.png, ImageFormat::Png)
            .map_err(|e| CanvasError::Decode(e.to_string()))?;
        Ok(image.to_rgba8())
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Snapshot({}x{} at {:?}, {} bytes)",
            self.width,
            self.height,
            self.origin,
            self.png.len()
        )
    }
}

#[derive(Clone)]
pub struct RasterSurface {
    image: RgbaImage,
    /// World position of pixel `(0, 0)`.
    origin: (i64, i64),
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RasterSurface({}x{} at {:?})", self.width(), self.height(), self.origin)
    }
}

impl RasterSurface {
    /// A transparent bitmap covering world `(0, 0)` to `(width, height)`.
    /// Zero dimensions are bumped to one pixel.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { image: RgbaImage::new(width.max(1), height.max(1)), origin: (0, 0) }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[must_use]
    pub fn origin(&self) -> (i64, i64) {
        self.origin
    }

    /// The world area the bitmap currently covers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn world_rect(&self) -> Rect {
        Rect::new(
            self.origin.0 as f64,
            self.origin.1 as f64,
            f64::from(self.width()),
            f64::from(self.height()),
        )
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// The pixel covering world position `(x, y)`, if the bitmap reaches it.
    #[must_use]
    pub fn pixel(&self, x: i64, y: i64) -> Option<Rgba<u8>> {
        let (Ok(lx), Ok(ly)) = (u32::try_from(x - self.origin.0), u32::try_from(y - self.origin.1)) else {
            return None;
        };
        self.image.get_pixel_checked(lx, ly).copied()
    }

    /// True when every pixel is fully transparent.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p[3] == 0)
    }

    pub fn clear(&mut self) {
        for p in self.image.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    /// PNG-encode the current pixels for the history log.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Encode`] if the PNG encoder fails.
    pub fn snapshot(&self) -> Result<Snapshot, CanvasError> {
        let png = encode_png(&self.image)?;
        Ok(Snapshot { origin: self.origin, width: self.width(), height: self.height(), png: Arc::from(png) })
    }

    /// Replace the content with `snapshot`, placed at its own world origin.
    /// Pixels the snapshot does not cover become transparent.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Decode`] if the snapshot cannot be decoded; the
    /// bitmap is left untouched.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), CanvasError> {
        let image = snapshot.decode()?;
        if snapshot.origin == self.origin && image.dimensions() == self.image.dimensions() {
            self.image = image;
            return Ok(());
        }
        self.clear();
        imageops::replace(
            &mut self.image,
            &image,
            snapshot.origin.0 - self.origin.0,
            snapshot.origin.1 - self.origin.1,
        );
        Ok(())
    }

    /// Grow the bitmap so it is at least `width` x `height`, keeping its
    /// origin and pixels. Never shrinks. Returns true if the size changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let w = self.width().max(width);
        let h = self.height().max(height);
        if w == self.width() && h == self.height() {
            return false;
        }
        self.image = reblit(&self.image, w, h, 0, 0);
        log::debug!("bitmap resized to {w}x{h}");
        true
    }

    /// Grow the bitmap in any direction so it covers the world box
    /// `min..max`, padding each side that grows. Growth stops at
    /// [`MAX_BITMAP_SIDE`] per axis. Returns true if the bitmap changed.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn ensure_covers(&mut self, min: Point, max: Point) -> bool {
        if ![min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite()) {
            return false;
        }
        let (ox, oy) = self.origin;
        let x = grow_span(ox, ox + i64::from(self.width()), world_floor(min.x), world_ceil(max.x));
        let y = grow_span(oy, oy + i64::from(self.height()), world_floor(min.y), world_ceil(max.y));
        if x.0 == ox && y.0 == oy && x.1 - x.0 == i64::from(self.width()) && y.1 - y.0 == i64::from(self.height()) {
            return false;
        }
        let (w, h) = ((x.1 - x.0) as u32, (y.1 - y.0) as u32);
        self.image = reblit(&self.image, w, h, ox - x.0, oy - y.0);
        self.origin = (x.0, y.0);
        log::debug!("bitmap grown to {w}x{h} at ({}, {})", x.0, y.0);
        true
    }

    /// Screen image for `viewport`: nearest-pixel sampling of the bitmap over
    /// an opaque `background`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn render_view(&self, viewport: &Viewport, width: u32, height: u32, background: Color) -> RgbaImage {
        let bg = background.opaque_pixel();
        let mut out = RgbaImage::from_pixel(width.max(1), height.max(1), bg);
        let bw = f64::from(self.width());
        let bh = f64::from(self.height());
        let (ox, oy) = (self.origin.0 as f64, self.origin.1 as f64);
        for (sx, sy, px) in out.enumerate_pixels_mut() {
            let world = viewport.to_world(Point::new(f64::from(sx) + 0.5, f64::from(sy) + 0.5));
            let (lx, ly) = (world.x - ox, world.y - oy);
            if lx < 0.0 || ly < 0.0 || lx >= bw || ly >= bh {
                continue;
            }
            let src = self.image.get_pixel(lx as u32, ly as u32);
            if src[3] != 0 {
                *px = over_opaque(*src, bg);
            }
        }
        out
    }

    /// The bitmap flattened onto an opaque background.
    #[must_use]
    pub fn flattened(&self, background: Color) -> RgbaImage {
        flatten(&self.image, background)
    }

    /// PNG encoding of the bitmap as-is (transparency preserved).
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Encode`] if the PNG encoder fails.
    pub fn to_png(&self) -> Result<Vec<u8>, CanvasError> {
        encode_png(&self.image)
    }

    /// `data:image/png;base64,...` URL of the bitmap, optionally flattened
    /// onto `background` first.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Encode`] if the PNG encoder fails.
    pub fn to_data_url(&self, background: Option<Color>) -> Result<String, CanvasError> {
        let bytes = match background {
            Some(bg) => encode_png(&self.flattened(bg))?,
            None => self.to_png()?,
        };
        Ok(format!("data:image/png;base64,{}", base64::engine::general_purpose::STANDARD.encode(bytes)))
    }
}

/// `image` composited onto an opaque `background`; every output pixel is opaque.
#[must_use]
pub fn flatten(image: &RgbaImage, background: Color) -> RgbaImage {
    let bg = background.opaque_pixel();
    let mut out = image.clone();
    for px in out.pixels_mut() {
        *px = over_opaque(*px, bg);
    }
    out
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CanvasError> {
    let mut bytes = Cursor::new(Vec::new());
    PngEncoder::new(&mut bytes)
        .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
        .map_err(|e| CanvasError::Encode(e.to_string()))?;
    Ok(bytes.into_inner())
}

/// Copy `src` into a fresh transparent `width` x `height` image at `(dx, dy)`.
fn reblit(src: &RgbaImage, width: u32, height: u32, dx: i64, dy: i64) -> RgbaImage {
    let mut out = RgbaImage::new(width, height);
    imageops::replace(&mut out, src, dx, dy);
    out
}

/// Integer world coordinates are bounded well inside `i64`.
const WORLD_LIMIT: f64 = 1e12;

#[allow(clippy::cast_possible_truncation)]
fn world_floor(v: f64) -> i64 {
    v.clamp(-WORLD_LIMIT, WORLD_LIMIT).floor() as i64
}

#[allow(clippy::cast_possible_truncation)]
fn world_ceil(v: f64) -> i64 {
    v.clamp(-WORLD_LIMIT, WORLD_LIMIT).ceil() as i64
}

/// Widen `[lo, hi)` toward `[want_lo, want_hi)` plus [`BITMAP_GROW_STEP`] on
/// each side that grows, keeping the span within [`MAX_BITMAP_SIDE`].
fn grow_span(lo: i64, hi: i64, want_lo: i64, want_hi: i64) -> (i64, i64) {
    let mut room = (i64::from(MAX_BITMAP_SIDE) - (hi - lo)).max(0);
    let mut new_lo = lo;
    if want_lo < lo {
        let step = (lo - want_lo + BITMAP_GROW_STEP).min(room);
        new_lo = lo - step;
        room -= step;
    }
    let mut new_hi = hi;
    if want_hi > hi {
        new_hi = hi + (want_hi - hi + BITMAP_GROW_STEP).min(room);
    }
    (new_lo, new_hi)
}

/// Per-stroke painting state: pre-stroke pixels plus max coverage per pixel.
#[derive(Clone)]
pub struct StrokeLayer {
    base: RgbaImage,
    origin: (i64, i64),
    coverage: Vec<f32>,
}

impl std::fmt::Debug for StrokeLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StrokeLayer({}x{} at {:?})", self.base.width(), self.base.height(), self.origin)
    }
}

impl StrokeLayer {
    /// Capture the surface before the first stamp of a stroke.
    #[must_use]
    pub fn begin(surface: &RasterSurface) -> Self {
        let len = surface.width() as usize * surface.height() as usize;
        Self { base: surface.image.clone(), origin: surface.origin, coverage: vec![0.0; len] }
    }

    /// Put the pre-stroke pixels back, dropping everything this stroke painted.
    /// The bitmap keeps any growth the stroke caused.
    pub fn discard(mut self, surface: &mut RasterSurface) {
        self.sync(surface);
        surface.image = self.base;
    }

    /// Paint a round-capped segment whose radius varies linearly from
    /// `radius_a` at `a` to `radius_b` at `b`, growing the bitmap to fit.
    /// Returns true if any pixel changed.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::too_many_arguments
    )]
    pub fn stamp_segment(
        &mut self,
        surface: &mut RasterSurface,
        a: Point,
        b: Point,
        radius_a: f64,
        radius_b: f64,
        paint: &Paint,
    ) -> bool {
        if ![a.x, a.y, b.x, b.y, radius_a, radius_b].iter().all(|v| v.is_finite()) {
            return false;
        }
        let reach = radius_a.max(radius_b) + 1.0;
        let lo = Point::new(a.x.min(b.x) - reach, a.y.min(b.y) - reach);
        let hi = Point::new(a.x.max(b.x) + reach, a.y.max(b.y) + reach);
        surface.ensure_covers(lo, hi);
        self.sync(surface);

        let (ox, oy) = (surface.origin.0 as f64, surface.origin.1 as f64);
        let min_x = (lo.x - ox).floor().max(0.0);
        let min_y = (lo.y - oy).floor().max(0.0);
        let max_x = (hi.x - ox).ceil().min(f64::from(surface.width()));
        let max_y = (hi.y - oy).ceil().min(f64::from(surface.height()));
        if min_x >= max_x || min_y >= max_y {
            return false;
        }

        let width = surface.width() as usize;
        let opacity = paint.opacity.clamp(0.0, 1.0);
        let mut changed = false;
        for y in (min_y as u32)..(max_y as u32) {
            for x in (min_x as u32)..(max_x as u32) {
                let center = Point::new(f64::from(x) + ox + 0.5, f64::from(y) + oy + 0.5);
                let (dist, t) = distance_to_segment(center, a, b);
                let radius = radius_a + (radius_b - radius_a) * t;
                let cov = (radius + 0.5 - dist).clamp(0.0, 1.0) as f32;
                let idx = y as usize * width + x as usize;
                if cov <= self.coverage[idx] {
                    continue;
                }
                self.coverage[idx] = cov;
                let next = composite(*self.base.get_pixel(x, y), paint, f64::from(cov) * opacity);
                let px = surface.image.get_pixel_mut(x, y);
                if *px != next {
                    *px = next;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Paint a filled disc.
    pub fn stamp_dot(&mut self, surface: &mut RasterSurface, center: Point, radius: f64, paint: &Paint) -> bool {
        self.stamp_segment(surface, center, center, radius, radius, paint)
    }

    /// Re-lay base pixels and coverage after the surface grew.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn sync(&mut self, surface: &RasterSurface) {
        if self.origin == surface.origin && self.base.dimensions() == surface.image.dimensions() {
            return;
        }
        let dx = self.origin.0 - surface.origin.0;
        let dy = self.origin.1 - surface.origin.1;
        let (old_w, old_h) = (i64::from(self.base.width()), i64::from(self.base.height()));
        let (new_w, new_h) = (i64::from(surface.width()), i64::from(surface.height()));

        let mut coverage = vec![0.0; (new_w * new_h) as usize];
        let x_from = (-dx).max(0);
        let x_to = old_w.min(new_w - dx);
        if x_from < x_to {
            let n = (x_to - x_from) as usize;
            for y in 0..old_h {
                let ny = y + dy;
                if !(0..new_h).contains(&ny) {
                    continue;
                }
                let src = (y * old_w + x_from) as usize;
                let dst = (ny * new_w + x_from + dx) as usize;
                coverage[dst..dst + n].copy_from_slice(&self.coverage[src..src + n]);
            }
        }
        self.coverage = coverage;
        self.base = reblit(&self.base, surface.width(), surface.height(), dx, dy);
        self.origin = surface.origin;
    }
}

/// Distance from `p` to segment `a-b` and the clamped projection parameter.
fn distance_to_segment(p: Point, a: Point, b: Point) -> (f64, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return (p.distance(a), 0.0);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let closest = Point::new(a.x + dx * t, a.y + dy * t);
    (p.distance(closest), t)
}

fn unit(v: u8) -> f64 {
    f64::from(v) / 255.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn byte(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Blend `paint` at effective alpha `alpha` onto straight-alpha `dst`.
fn composite(dst: Rgba<u8>, paint: &Paint, alpha: f64) -> Rgba<u8> {
    let sa = alpha.clamp(0.0, 1.0);
    let da = unit(dst[3]);
    let dc = [unit(dst[0]), unit(dst[1]), unit(dst[2])];
    let sc = [unit(paint.color.r), unit(paint.color.g), unit(paint.color.b)];

    match paint.composite {
        CompositeMode::DestinationOut => {
            let oa = da * (1.0 - sa);
            if oa <= 0.0 {
                return Rgba([0, 0, 0, 0]);
            }
            Rgba([dst[0], dst[1], dst[2], byte(oa)])
        }
        CompositeMode::SourceOver => source_over(sc, sa, dc, da),
        CompositeMode::Multiply => {
            let mixed = [0, 1, 2].map(|i| (1.0 - da) * sc[i] + da * sc[i] * dc[i]);
            source_over(mixed, sa, dc, da)
        }
    }
}

fn source_over(sc: [f64; 3], sa: f64, dc: [f64; 3], da: f64) -> Rgba<u8> {
    let oa = sa + da * (1.0 - sa);
    if oa <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let ch = |i: usize| byte((sc[i] * sa + dc[i] * da * (1.0 - sa)) / oa);
    Rgba([ch(0), ch(1), ch(2), byte(oa)])
}

/// Composite straight-alpha `src` over an opaque background pixel.
fn over_opaque(src: Rgba<u8>, bg: Rgba<u8>) -> Rgba<u8> {
    let a = unit(src[3]);
    let ch = |i: usize| byte(unit(src[i]) * a + unit(bg[i]) * (1.0 - a));
    Rgba([ch(0), ch(1), ch(2), 255])
}
