//! Drawing engine: turns a pointer gesture into ink on the raster surface.
//!
//! A stroke is `Idle -> Active -> Idle`. [`DrawingEngine::begin`] fixes the
//! style and stamps the first point so even a tap leaves a visible dot,
//! [`DrawingEngine::extend`] paints every new point immediately, and
//! [`DrawingEngine::end`] commits a snapshot of the whole bitmap to the
//! history log when the stroke changed at least one pixel. Points are world coordinates; the caller converts from screen
//! space with the viewport that was current when the event arrived.

#[cfg(test)]
#[path = "drawing_test.rs"]
mod drawing_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::consts::{
    CURVE_SEGMENTS, ERASER_WIDTH, HIGHLIGHTER_OPACITY, HIGHLIGHTER_WIDTH, MARKER_OPACITY, MARKER_WIDTH,
    MAX_BRUSH_WIDTH, MIN_BRUSH_OPACITY, MIN_BRUSH_WIDTH, PENCIL_OPACITY, PENCIL_WIDTH,
};
use crate::history::History;
use crate::raster::{Color, CompositeMode, Paint, RasterSurface, Snapshot, StrokeLayer};

/// Brush presets offered by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushType {
    #[default]
    Pencil,
    Marker,
    Highlighter,
}

impl BrushType {
    /// Default `(width, opacity)` for the preset.
    #[must_use]
    pub fn defaults(self) -> (f64, f64) {
        match self {
            Self::Pencil => (PENCIL_WIDTH, PENCIL_OPACITY),
            Self::Marker => (MARKER_WIDTH, MARKER_OPACITY),
            Self::Highlighter => (HIGHLIGHTER_WIDTH, HIGHLIGHTER_OPACITY),
        }
    }

    #[must_use]
    pub fn composite(self) -> CompositeMode {
        match self {
            Self::Highlighter => CompositeMode::Multiply,
            Self::Pencil | Self::Marker => CompositeMode::SourceOver,
        }
    }
}

/// Toolbar brush state read at stroke start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    pub color: Color,
    pub brush_type: BrushType,
    /// Explicit width from the size slider, overriding the preset.
    pub size: Option<f64>,
    /// Explicit opacity from the opacity slider, overriding the preset.
    pub opacity: Option<f64>,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self { color: Color::BLACK, brush_type: BrushType::Pencil, size: None, opacity: None }
    }
}

/// Width and paint fixed for the lifetime of one stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub paint: Paint,
}

impl StrokeStyle {
    /// Ink style for the draw tool.
    #[must_use]
    pub fn brush(settings: &BrushSettings) -> Self {
        let (width, opacity) = settings.brush_type.defaults();
        let width = settings
            .size
            .filter(|s| s.is_finite())
            .map_or(width, |s| s.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH));
        let opacity = settings
            .opacity
            .filter(|o| o.is_finite())
            .map_or(opacity, |o| o.clamp(MIN_BRUSH_OPACITY, 1.0));
        Self {
            width,
            paint: Paint { color: settings.color, opacity, composite: settings.brush_type.composite() },
        }
    }

    /// Erase-through style; color is irrelevant.
    #[must_use]
    pub fn eraser() -> Self {
        Self {
            width: ERASER_WIDTH,
            paint: Paint { color: Color::BLACK, opacity: 1.0, composite: CompositeMode::DestinationOut },
        }
    }
}

/// Behavior switches for live stroke rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    /// Render quadratic curves through segment midpoints instead of straight joins.
    pub smooth_live: bool,
    /// Scale width by reported pointer pressure.
    pub pressure_sensitive: bool,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self { smooth_live: true, pressure_sensitive: true }
    }
}

/// How a finished stroke was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeOutcome {
    /// A snapshot was pushed to history.
    Recorded,
    /// No pixel changed (e.g. erasing empty space); history is untouched.
    Unchanged,
    /// Pixels changed but the snapshot could not be encoded.
    Unrecorded,
}

#[derive(Debug, Clone, Copy)]
struct StrokePoint {
    at: Point,
    radius: f64,
}

#[derive(Debug)]
struct ActiveStroke {
    style: StrokeStyle,
    layer: StrokeLayer,
    points: Vec<StrokePoint>,
    /// End of the last rendered curve piece (smooth mode).
    tail: StrokePoint,
    changed: bool,
}

#[derive(Debug, Default)]
pub struct DrawingEngine {
    config: DrawingConfig,
    active: Option<ActiveStroke>,
}

impl DrawingEngine {
    #[must_use]
    pub fn new(config: DrawingConfig) -> Self {
        Self { config, active: None }
    }

    #[must_use]
    pub fn config(&self) -> DrawingConfig {
        self.config
    }

    pub fn set_config(&mut self, config: DrawingConfig) {
        self.config = config;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Style of the stroke in progress.
    #[must_use]
    pub fn style(&self) -> Option<StrokeStyle> {
        self.active.as_ref().map(|s| s.style)
    }

    /// Number of points captured by the stroke in progress.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.active.as_ref().map_or(0, |s| s.points.len())
    }

    /// Start a stroke at `world` and stamp its first dot.
    ///
    /// A stroke already in progress is kept on the bitmap but never reaches
    /// the history log; callers end strokes before starting new ones.
    pub fn begin(&mut self, surface: &mut RasterSurface, world: Point, pressure: Option<f64>, style: StrokeStyle) {
        if self.active.is_some() {
            log::warn!("stroke started while another was active");
        }
        let first = StrokePoint { at: world, radius: self.radius(style.width, pressure) };
        let mut layer = StrokeLayer::begin(surface);
        let changed = layer.stamp_dot(surface, first.at, first.radius, &style.paint);
        log::debug!("stroke begin at ({:.1}, {:.1}) width {:.1}", world.x, world.y, style.width);
        self.active = Some(ActiveStroke { style, layer, points: vec![first], tail: first, changed });
    }

    /// Add a point and paint the new piece. Returns false when idle or when
    /// the point repeats the previous one.
    pub fn extend(&mut self, surface: &mut RasterSurface, world: Point, pressure: Option<f64>) -> bool {
        let smooth = self.config.smooth_live;
        let Some(radius) = self.active.as_ref().map(|s| self.radius(s.style.width, pressure)) else {
            return false;
        };
        let Some(stroke) = self.active.as_mut() else {
            return false;
        };
        let Some(&prev) = stroke.points.last() else {
            return false;
        };
        if prev.at == world {
            return false;
        }
        let next = StrokePoint { at: world, radius };
        stroke.points.push(next);

        let paint = stroke.style.paint;
        if smooth {
            let mid = StrokePoint { at: prev.at.midpoint(next.at), radius: (prev.radius + next.radius) * 0.5 };
            stroke.changed |= stamp_quadratic(&mut stroke.layer, surface, stroke.tail, prev.at, mid, &paint);
            stroke.tail = mid;
        } else {
            stroke.changed |= stroke.layer.stamp_segment(surface, prev.at, next.at, prev.radius, next.radius, &paint);
            stroke.tail = next;
        }
        true
    }

    /// Finish the stroke and push a snapshot of the bitmap if it changed.
    /// Returns `None` if no stroke was active.
    pub fn end(&mut self, surface: &mut RasterSurface, history: &mut History<Snapshot>) -> Option<StrokeOutcome> {
        let mut stroke = self.active.take()?;
        if let Some(&last) = stroke.points.last() {
            if stroke.points.len() > 1 && stroke.tail.at != last.at {
                let paint = stroke.style.paint;
                stroke.changed |= stroke.layer.stamp_segment(
                    surface,
                    stroke.tail.at,
                    last.at,
                    stroke.tail.radius,
                    last.radius,
                    &paint,
                );
            }
        }
        log::debug!("stroke end: {} points, changed {}", stroke.points.len(), stroke.changed);
        if !stroke.changed {
            return Some(StrokeOutcome::Unchanged);
        }
        match surface.snapshot() {
            Ok(snapshot) => {
                history.push(snapshot);
                Some(StrokeOutcome::Recorded)
            }
            Err(e) => {
                log::error!("stroke kept but not undoable: {e}");
                Some(StrokeOutcome::Unrecorded)
            }
        }
    }

    /// Drop the live stroke and restore the pixels it covered. History is untouched.
    pub fn cancel(&mut self, surface: &mut RasterSurface) -> bool {
        match self.active.take() {
            Some(stroke) => {
                stroke.layer.discard(surface);
                true
            }
            None => false,
        }
    }

    fn radius(&self, width: f64, pressure: Option<f64>) -> f64 {
        let scale = match pressure {
            Some(p) if self.config.pressure_sensitive && p > 0.0 && p.is_finite() => p.min(1.0),
            _ => 1.0,
        };
        (width * scale).max(MIN_BRUSH_WIDTH) * 0.5
    }
}

/// Point on the quadratic Bezier `from -> to` controlled by `ctrl` at `t`.
#[must_use]
pub fn quadratic_point(from: Point, ctrl: Point, to: Point, t: f64) -> Point {
    let u = 1.0 - t;
    Point::new(
        u * u * from.x + 2.0 * u * t * ctrl.x + t * t * to.x,
        u * u * from.y + 2.0 * u * t * ctrl.y + t * t * to.y,
    )
}

fn stamp_quadratic(
    layer: &mut StrokeLayer,
    surface: &mut RasterSurface,
    from: StrokePoint,
    ctrl: Point,
    to: StrokePoint,
    paint: &Paint,
) -> bool {
    let steps = f64::from(CURVE_SEGMENTS);
    let mut prev = from;
    let mut changed = false;
    for i in 1..=CURVE_SEGMENTS {
        let t = f64::from(i) / steps;
        let next = StrokePoint {
            at: quadratic_point(from.at, ctrl, to.at, t),
            radius: from.radius + (to.radius - from.radius) * t,
        };
        changed |= layer.stamp_segment(surface, prev.at, next.at, prev.radius, next.radius, paint);
        prev = next;
    }
    changed
}
