//! Element drawing manager: the object-based stroke model.
//!
//! Each finished stroke becomes a [`DrawingElement`] holding its own point
//! list and style, so it can be selected, moved, flipped, scaled, recolored,
//! laid out and grouped after the fact. Elements never touch the raster
//! bitmap; they are drawn as an overlay.
//!
//! The bounding box of an element is always derived from `points`. Every
//! mutation rewrites the points first and then recomputes `x/y/width/height`.

#[cfg(test)]
#[path = "elements_test.rs"]
mod elements_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::{Point, Rect};
use crate::consts::{DUPLICATE_OFFSET, HIT_MARGIN_PX, ORGANIZE_PADDING};
use crate::drawing::{BrushSettings, BrushType, StrokeStyle};
use crate::raster::Color;

/// Unique identifier for a drawing element.
pub type ElementId = Uuid;

/// Style captured when an element stroke is finished.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    pub color: Color,
    pub brush_type: BrushType,
    pub line_width: f64,
    pub opacity: f64,
}

impl ElementStyle {
    /// Resolve the toolbar brush the same way raster strokes do.
    #[must_use]
    pub fn from_brush(settings: &BrushSettings) -> Self {
        let style = StrokeStyle::brush(settings);
        Self {
            color: settings.color,
            brush_type: settings.brush_type,
            line_width: style.width,
            opacity: style.paint.opacity,
        }
    }
}

/// Mirror axis for [`ElementManager::flip_selected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    /// Mirror left/right about the vertical center line.
    Horizontal,
    /// Mirror top/bottom about the horizontal center line.
    Vertical,
}

/// A freehand stroke stored as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingElement {
    pub id: ElementId,
    pub points: Vec<Point>,
    pub color: Color,
    pub brush_type: BrushType,
    pub line_width: f64,
    pub opacity: f64,
    /// Left edge of the bounding box in world coordinates.
    pub x: f64,
    /// Top edge of the bounding box in world coordinates.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees around the bounding-box center.
    pub rotation: f64,
    pub is_selected: bool,
    /// Cluster assigned by [`ElementManager::auto_group`].
    pub group_id: Option<u32>,
}

impl DrawingElement {
    #[must_use]
    pub fn new(points: Vec<Point>, style: &ElementStyle) -> Self {
        let mut el = Self {
            id: Uuid::new_v4(),
            points,
            color: style.color,
            brush_type: style.brush_type,
            line_width: style.line_width,
            opacity: style.opacity,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            is_selected: false,
            group_id: None,
        };
        el.recompute_bounds();
        el
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[must_use]
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.map_points(|p| Point::new(p.x + dx, p.y + dy));
    }

    /// Mirror about the bounding-box center.
    pub fn flip(&mut self, axis: FlipAxis) {
        let c = self.center();
        match axis {
            FlipAxis::Horizontal => self.map_points(|p| Point::new(2.0 * c.x - p.x, p.y)),
            FlipAxis::Vertical => self.map_points(|p| Point::new(p.x, 2.0 * c.y - p.y)),
        }
    }

    /// Scale about the bounding-box center. Non-positive or non-finite
    /// factors are ignored and return false.
    pub fn scale(&mut self, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let c = self.center();
        self.map_points(|p| Point::new(c.x + (p.x - c.x) * factor, c.y + (p.y - c.y) * factor));
        true
    }

    /// Whether `world` lies within `margin` (plus half the line width) of the stroke.
    #[must_use]
    pub fn hit(&self, world: Point, margin: f64) -> bool {
        let tolerance = self.line_width * 0.5 + margin;
        if !self.bounds().contains_with_margin(world, tolerance) {
            return false;
        }
        match self.points.as_slice() {
            [] => false,
            [only] => only.distance(world) <= tolerance,
            pts => pts
                .windows(2)
                .any(|w| point_segment_distance(world, w[0], w[1]) <= tolerance),
        }
    }

    fn map_points(&mut self, f: impl Fn(Point) -> Point) {
        for p in &mut self.points {
            *p = f(*p);
        }
        self.recompute_bounds();
    }

    fn recompute_bounds(&mut self) {
        let Some(first) = self.points.first() else {
            self.x = 0.0;
            self.y = 0.0;
            self.width = 0.0;
            self.height = 0.0;
            return;
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        self.x = min_x;
        self.y = min_y;
        self.width = max_x - min_x;
        self.height = max_y - min_y;
    }
}

/// Distance from `p` to the segment `a-b`.
#[must_use]
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + dx * t, a.y + dy * t))
}

/// Jitter smoothing: each interior point becomes `(prev + 2*cur + next) / 4`;
/// endpoints are kept. Collinear evenly spaced input is returned unchanged.
#[must_use]
pub fn smooth_points(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(points.len());
    out.push(points[0]);
    for w in points.windows(3) {
        out.push(Point::new(
            (w[0].x + 2.0 * w[1].x + w[2].x) / 4.0,
            (w[0].y + 2.0 * w[1].y + w[2].y) / 4.0,
        ));
    }
    out.push(points[points.len() - 1]);
    out
}

/// Owns every drawing element in stacking order (last is topmost).
#[derive(Debug, Default)]
pub struct ElementManager {
    elements: Vec<DrawingElement>,
    pending: Option<Vec<Point>>,
    move_mode: bool,
}

impl ElementManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Stroke capture ---

    pub fn start_stroke(&mut self, world: Point) {
        self.pending = Some(vec![world]);
    }

    /// Append a point to the stroke being captured. Returns false when idle.
    pub fn add_point(&mut self, world: Point) -> bool {
        match self.pending.as_mut() {
            Some(points) => {
                points.push(world);
                true
            }
            None => false,
        }
    }

    /// Smooth the captured points and store them as a new element.
    pub fn finish_stroke(&mut self, style: &ElementStyle) -> Option<ElementId> {
        let points = self.pending.take()?;
        if points.is_empty() {
            return None;
        }
        let el = DrawingElement::new(smooth_points(&points), style);
        let id = el.id;
        log::debug!("element stroke finished: {} points", el.points.len());
        self.elements.push(el);
        Some(id)
    }

    pub fn cancel_stroke(&mut self) -> bool {
        self.pending.take().is_some()
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.pending.is_some()
    }

    /// Raw points of the stroke being captured, for live preview.
    #[must_use]
    pub fn pending_points(&self) -> &[Point] {
        self.pending.as_deref().unwrap_or_default()
    }

    // --- Queries ---

    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&DrawingElement> {
        self.elements.iter().find(|e| e.id == *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawingElement> {
        self.elements.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Topmost element under `world`. The margin is [`HIT_MARGIN_PX`] screen
    /// pixels converted with `zoom`.
    #[must_use]
    pub fn hit_test(&self, world: Point, zoom: f64) -> Option<ElementId> {
        let margin = HIT_MARGIN_PX / zoom;
        self.elements.iter().rev().find(|e| e.hit(world, margin)).map(|e| e.id)
    }

    // --- Selection ---

    /// Select exactly `id`. Returns false if no such element exists.
    pub fn select(&mut self, id: &ElementId) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        for e in &mut self.elements {
            e.is_selected = e.id == *id;
        }
        true
    }

    pub fn select_all(&mut self) {
        for e in &mut self.elements {
            e.is_selected = true;
        }
    }

    /// Returns true if anything was selected before.
    pub fn clear_selection(&mut self) -> bool {
        let mut changed = false;
        for e in &mut self.elements {
            changed |= e.is_selected;
            e.is_selected = false;
        }
        changed
    }

    #[must_use]
    pub fn selected_ids(&self) -> Vec<ElementId> {
        self.elements.iter().filter(|e| e.is_selected).map(|e| e.id).collect()
    }

    #[must_use]
    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.element(id).is_some_and(|e| e.is_selected)
    }

    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.elements.iter().any(|e| e.is_selected)
    }

    /// In move mode a drag anywhere moves every element.
    pub fn set_move_mode(&mut self, on: bool) {
        self.move_mode = on;
    }

    #[must_use]
    pub fn move_mode(&self) -> bool {
        self.move_mode
    }

    // --- Transforms ---

    pub fn move_selected(&mut self, dx: f64, dy: f64) -> bool {
        self.for_selected(|e| e.translate(dx, dy))
    }

    pub fn move_all(&mut self, dx: f64, dy: f64) -> bool {
        for e in &mut self.elements {
            e.translate(dx, dy);
        }
        !self.elements.is_empty()
    }

    pub fn flip_selected(&mut self, axis: FlipAxis) -> bool {
        self.for_selected(|e| e.flip(axis))
    }

    /// Scale every selected element about its own center.
    pub fn scale_selected(&mut self, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        self.for_selected(|e| {
            e.scale(factor);
        })
    }

    pub fn recolor_selected(&mut self, color: Color) -> bool {
        self.for_selected(|e| e.color = color)
    }

    /// Copy every selected element offset by [`DUPLICATE_OFFSET`]. The copies
    /// become the selection.
    pub fn duplicate_selected(&mut self) -> Vec<ElementId> {
        let mut copies: Vec<DrawingElement> = self
            .elements
            .iter()
            .filter(|e| e.is_selected)
            .cloned()
            .collect();
        if copies.is_empty() {
            return Vec::new();
        }
        self.clear_selection();
        let mut ids = Vec::with_capacity(copies.len());
        for c in &mut copies {
            c.id = Uuid::new_v4();
            c.group_id = None;
            c.translate(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
            ids.push(c.id);
        }
        self.elements.extend(copies);
        ids
    }

    /// Remove and return the ids of every selected element.
    pub fn delete_selected(&mut self) -> Vec<ElementId> {
        let ids = self.selected_ids();
        self.elements.retain(|e| !e.is_selected);
        ids
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.pending = None;
        self.move_mode = false;
    }

    // --- Batch layout ---

    /// Lay elements out on a grid in index order.
    ///
    /// The grid has `ceil(sqrt(n))` columns, square cells sized by the largest
    /// element dimension plus [`ORGANIZE_PADDING`], and starts at the current
    /// top-left corner of all elements.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn organize(&mut self) -> bool {
        if self.elements.is_empty() {
            return false;
        }
        let n = self.elements.len();
        let cols = ((n as f64).sqrt().ceil() as usize).max(1);
        let cell = self
            .elements
            .iter()
            .map(|e| e.width.max(e.height))
            .fold(0.0, f64::max)
            + ORGANIZE_PADDING;
        let origin_x = self.elements.iter().map(|e| e.x).fold(f64::INFINITY, f64::min);
        let origin_y = self.elements.iter().map(|e| e.y).fold(f64::INFINITY, f64::min);

        for (i, e) in self.elements.iter_mut().enumerate() {
            let col = (i % cols) as f64;
            let row = (i / cols) as f64;
            let tx = origin_x + col * cell;
            let ty = origin_y + row * cell;
            e.translate(tx - e.x, ty - e.y);
        }
        true
    }

    /// Single-linkage clustering by center distance. Elements whose centers
    /// are within `threshold` end up in the same group; group ids are
    /// numbered from 1 in order of each cluster's first element. Returns the
    /// number of groups with more than one member.
    pub fn auto_group(&mut self, threshold: f64) -> usize {
        let n = self.elements.len();
        let mut parent: Vec<usize> = (0..n).collect();
        let centers: Vec<Point> = self.elements.iter().map(DrawingElement::center).collect();
        for i in 0..n {
            for j in (i + 1)..n {
                if centers[i].distance(centers[j]) <= threshold {
                    union(&mut parent, i, j);
                }
            }
        }

        let roots: Vec<usize> = (0..n).map(|i| find(&mut parent, i)).collect();
        let mut sizes = vec![0usize; n];
        for &r in &roots {
            sizes[r] += 1;
        }

        let mut ids: Vec<Option<u32>> = vec![None; n];
        let mut next = 1u32;
        for (el, &root) in self.elements.iter_mut().zip(&roots) {
            if sizes[root] < 2 {
                el.group_id = None;
                continue;
            }
            let id = match ids[root] {
                Some(id) => id,
                None => {
                    ids[root] = Some(next);
                    next += 1;
                    next - 1
                }
            };
            el.group_id = Some(id);
        }
        (next - 1) as usize
    }

    fn for_selected(&mut self, mut f: impl FnMut(&mut DrawingElement)) -> bool {
        let mut any = false;
        for e in self.elements.iter_mut().filter(|e| e.is_selected) {
            f(e);
            any = true;
        }
        any
    }
}

fn find(parent: &mut [usize], i: usize) -> usize {
    let mut root = i;
    while parent[root] != root {
        root = parent[root];
    }
    let mut cur = i;
    while parent[cur] != root {
        let next = parent[cur];
        parent[cur] = root;
        cur = next;
    }
    root
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}
