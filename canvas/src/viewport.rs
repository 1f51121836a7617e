//! Viewport controller: the single owner of the pan/zoom state.
//!
//! Every mutation of the [`Viewport`] goes through this type. Zoom is clamped to
//! `[min_zoom, max_zoom]` on every write, anchored zooms keep the world point
//! under the anchor fixed, and each effective change bumps a revision counter
//! and notifies subscribed listeners so the host can redraw the main view and
//! the minimap.
//!
//! Smooth panning is time-driven: [`ViewportController::smooth_pan_to`] records
//! the animation and the host calls [`ViewportController::tick`] once per
//! animation frame. Any other mutation cancels a running animation.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::camera::{Point, Viewport};
use crate::consts::{MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};

/// Handle returned by [`ViewportController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&Viewport)>;

/// An in-flight animated pan from one translation to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothPan {
    pub from: Point,
    pub to: Point,
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl SmoothPan {
    /// Translation at `now_ms` and whether the animation has finished.
    #[must_use]
    pub fn sample(&self, now_ms: f64) -> (Point, bool) {
        if self.duration_ms <= 0.0 {
            return (self.to, true);
        }
        let t = ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0);
        let eased = ease_out_cubic(t);
        let pos = Point::new(
            self.from.x + (self.to.x - self.from.x) * eased,
            self.from.y + (self.to.y - self.from.y) * eased,
        );
        (pos, t >= 1.0)
    }
}

/// Cubic ease-out: fast start, gentle landing.
#[must_use]
pub fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

pub struct ViewportController {
    viewport: Viewport,
    screen_width: f64,
    screen_height: f64,
    min_zoom: f64,
    max_zoom: f64,
    animation: Option<SmoothPan>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    revision: u64,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ViewportController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportController")
            .field("viewport", &self.viewport)
            .field("screen_width", &self.screen_width)
            .field("screen_height", &self.screen_height)
            .field("animation", &self.animation)
            .field("listeners", &self.listeners.len())
            .field("revision", &self.revision)
            .finish()
    }
}

impl ViewportController {
    #[must_use]
    pub fn new() -> Self {
        Self::with_zoom_bounds(MIN_ZOOM, MAX_ZOOM)
    }

    /// Create a controller with custom zoom bounds. Bounds are reordered if
    /// given backwards and forced positive.
    #[must_use]
    pub fn with_zoom_bounds(min_zoom: f64, max_zoom: f64) -> Self {
        let lo = min_zoom.min(max_zoom).max(f64::EPSILON);
        let hi = min_zoom.max(max_zoom).max(lo);
        Self {
            viewport: Viewport::default(),
            screen_width: 0.0,
            screen_height: 0.0,
            min_zoom: lo,
            max_zoom: hi,
            animation: None,
            listeners: Vec::new(),
            next_listener: 0,
            revision: 0,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.viewport.zoom
    }

    #[must_use]
    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// Incremented on every effective change to the viewport.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn screen_size(&self) -> (f64, f64) {
        (self.screen_width, self.screen_height)
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    #[must_use]
    pub fn animation(&self) -> Option<SmoothPan> {
        self.animation
    }

    /// World point currently shown at the center of the screen.
    #[must_use]
    pub fn center_world(&self) -> Point {
        self.viewport
            .to_world(Point::new(self.screen_width * 0.5, self.screen_height * 0.5))
    }

    // --- Notification ---

    /// Register a callback fired after every viewport change.
    pub fn subscribe(&mut self, listener: impl FnMut(&Viewport) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns false when the id is unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    // --- Mutations ---

    /// Record the visible screen size in CSS pixels. Does not move the view.
    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        self.screen_width = width.max(0.0);
        self.screen_height = height.max(0.0);
    }

    /// Translate by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.cancel_animation();
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let next = Viewport { x: self.viewport.x + dx, y: self.viewport.y + dy, zoom: self.viewport.zoom };
        self.commit(next);
    }

    /// Zoom to `new_zoom` (clamped) keeping the world point under
    /// `(screen_x, screen_y)` fixed on screen.
    pub fn zoom_to_point(&mut self, new_zoom: f64, screen_x: f64, screen_y: f64) {
        self.cancel_animation();
        let zoom = self.clamp_zoom(new_zoom);
        let anchor = Point::new(screen_x, screen_y);
        let world = self.viewport.to_world(anchor);
        let next = Viewport {
            x: screen_x - world.x * zoom,
            y: screen_y - world.y * zoom,
            zoom,
        };
        self.commit(next);
    }

    /// Step the zoom in or out by [`ZOOM_STEP`] without moving the translation.
    pub fn zoom_by_step(&mut self, zoom_in: bool) {
        self.cancel_animation();
        let delta = if zoom_in { ZOOM_STEP } else { -ZOOM_STEP };
        let zoom = self.clamp_zoom(self.viewport.zoom + delta);
        let next = Viewport { zoom, ..self.viewport };
        self.commit(next);
    }

    /// Restore the identity transform `{0, 0, 1}`.
    pub fn reset_zoom(&mut self) {
        self.cancel_animation();
        self.commit(Viewport::default());
    }

    /// Full reset: identity transform and no pending animation.
    pub fn reset(&mut self) {
        self.reset_zoom();
    }

    /// Position the view so `world` maps to the screen center.
    pub fn center_on(&mut self, world: Point) {
        self.cancel_animation();
        let next = self.centered_on(world);
        self.commit(next);
    }

    /// Start an eased pan of the translation to `(target_x, target_y)`.
    ///
    /// Supersedes any animation already running. A non-positive duration
    /// jumps immediately.
    pub fn smooth_pan_to(&mut self, target_x: f64, target_y: f64, duration_ms: f64, now_ms: f64) {
        self.animation = None;
        let target = Point::new(target_x, target_y);
        if duration_ms <= 0.0 {
            let next = Viewport { x: target.x, y: target.y, zoom: self.viewport.zoom };
            self.commit(next);
            return;
        }
        self.animation = Some(SmoothPan {
            from: Point::new(self.viewport.x, self.viewport.y),
            to: target,
            start_ms: now_ms,
            duration_ms,
        });
        log::debug!("smooth pan to ({target_x:.1}, {target_y:.1}) over {duration_ms}ms");
    }

    /// Animated variant of [`Self::center_on`].
    pub fn smooth_center_on(&mut self, world: Point, duration_ms: f64, now_ms: f64) {
        let target = self.centered_on(world);
        self.smooth_pan_to(target.x, target.y, duration_ms, now_ms);
    }

    /// Advance a running animation. Returns true when the viewport moved.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let Some(anim) = self.animation else {
            return false;
        };
        let (pos, done) = anim.sample(now_ms);
        if done {
            self.animation = None;
        }
        let next = Viewport { x: pos.x, y: pos.y, zoom: self.viewport.zoom };
        self.commit(next)
    }

    /// Stop a running animation where it is. Returns true if one was running.
    pub fn cancel_animation(&mut self) -> bool {
        self.animation.take().is_some()
    }

    // --- Internals ---

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.viewport.zoom;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    fn centered_on(&self, world: Point) -> Viewport {
        let zoom = self.viewport.zoom;
        Viewport {
            x: self.screen_width * 0.5 - world.x * zoom,
            y: self.screen_height * 0.5 - world.y * zoom,
            zoom,
        }
    }

    fn commit(&mut self, next: Viewport) -> bool {
        if next == self.viewport {
            return false;
        }
        self.viewport = next;
        self.revision += 1;
        let snapshot = self.viewport;
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
        true
    }
}
