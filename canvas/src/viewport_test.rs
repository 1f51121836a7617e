#![allow(clippy::float_cmp)]

use std::cell::Cell;
use std::rc::Rc;

use super::*;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn controller_with_screen(w: f64, h: f64) -> ViewportController {
    let mut c = ViewportController::new();
    c.set_screen_size(w, h);
    c
}

// =============================================================
// Defaults
// =============================================================

#[test]
fn new_controller_is_identity() {
    let c = ViewportController::new();
    assert_eq!(c.viewport(), Viewport::default());
    assert_eq!(c.revision(), 0);
    assert!(!c.is_animating());
}

#[test]
fn zoom_bounds_are_reordered() {
    let c = ViewportController::with_zoom_bounds(4.0, 0.5);
    assert_eq!(c.zoom_bounds(), (0.5, 4.0));
}

// =============================================================
// pan_by
// =============================================================

#[test]
fn pan_by_translates_without_zoom_change() {
    let mut c = ViewportController::new();
    c.pan_by(10.0, -5.0);
    c.pan_by(2.5, 1.0);
    let vp = c.viewport();
    assert_eq!(vp.x, 12.5);
    assert_eq!(vp.y, -4.0);
    assert_eq!(vp.zoom, 1.0);
    assert_eq!(c.revision(), 2);
}

#[test]
fn pan_by_zero_is_not_a_change() {
    let mut c = ViewportController::new();
    c.pan_by(0.0, 0.0);
    assert_eq!(c.revision(), 0);
}

// =============================================================
// zoom_to_point
// =============================================================

#[test]
fn zoom_to_point_keeps_world_point_under_anchor() {
    let anchors = [(0.0, 0.0), (400.0, 300.0), (-50.0, 1200.0), (13.5, 7.25)];
    let zooms = [0.1, 0.37, 1.0, 2.5, 5.0, 20.0, 0.01];
    for &(sx, sy) in &anchors {
        for &z in &zooms {
            let mut c = ViewportController::new();
            c.pan_by(37.0, -81.0);
            c.zoom_to_point(1.7, 100.0, 100.0);
            let anchor = Point::new(sx, sy);
            let before = c.viewport().to_world(anchor);
            c.zoom_to_point(z, sx, sy);
            let after = c.viewport().to_world(anchor);
            assert!((before.x - after.x).abs() < 1e-6, "x drift at {sx},{sy} z={z}");
            assert!((before.y - after.y).abs() < 1e-6, "y drift at {sx},{sy} z={z}");
        }
    }
}

#[test]
fn zoom_to_point_clamps_to_bounds() {
    let mut c = ViewportController::new();
    c.zoom_to_point(20.0, 10.0, 10.0);
    assert_eq!(c.zoom(), MAX_ZOOM);
    c.zoom_to_point(0.0001, 10.0, 10.0);
    assert_eq!(c.zoom(), MIN_ZOOM);
    c.zoom_to_point(-3.0, 10.0, 10.0);
    assert_eq!(c.zoom(), MIN_ZOOM);
}

#[test]
fn zoom_to_point_ignores_nan() {
    let mut c = ViewportController::new();
    c.zoom_to_point(f64::NAN, 10.0, 10.0);
    assert_eq!(c.viewport(), Viewport::default());
}

#[test]
fn zoom_to_point_at_bound_is_noop() {
    let mut c = ViewportController::new();
    c.zoom_to_point(MAX_ZOOM, 0.0, 0.0);
    let rev = c.revision();
    c.zoom_to_point(MAX_ZOOM * 2.0, 50.0, 50.0);
    assert_eq!(c.revision(), rev);
}

// =============================================================
// zoom_by_step / reset_zoom
// =============================================================

#[test]
fn zoom_by_step_changes_zoom_only() {
    let mut c = ViewportController::new();
    c.pan_by(30.0, 40.0);
    c.zoom_by_step(true);
    let vp = c.viewport();
    assert!(approx_eq(vp.zoom, 1.0 + ZOOM_STEP));
    assert_eq!(vp.x, 30.0);
    assert_eq!(vp.y, 40.0);
    c.zoom_by_step(false);
    c.zoom_by_step(false);
    assert!(approx_eq(c.zoom(), 1.0 - ZOOM_STEP));
}

#[test]
fn zoom_by_step_clamps() {
    let mut c = ViewportController::new();
    for _ in 0..100 {
        c.zoom_by_step(true);
    }
    assert_eq!(c.zoom(), MAX_ZOOM);
    for _ in 0..100 {
        c.zoom_by_step(false);
    }
    assert_eq!(c.zoom(), MIN_ZOOM);
}

#[test]
fn reset_zoom_restores_identity() {
    let mut c = ViewportController::new();
    c.pan_by(5.0, 5.0);
    c.zoom_to_point(3.0, 100.0, 100.0);
    c.reset_zoom();
    assert_eq!(c.viewport(), Viewport::default());
}

// =============================================================
// center_on
// =============================================================

#[test]
fn center_on_maps_world_point_to_screen_center() {
    let mut c = controller_with_screen(800.0, 600.0);
    c.zoom_to_point(2.0, 0.0, 0.0);
    c.center_on(Point::new(100.0, -50.0));
    let screen = c.viewport().to_screen(Point::new(100.0, -50.0));
    assert!(approx_eq(screen.x, 400.0));
    assert!(approx_eq(screen.y, 300.0));
    let center = c.center_world();
    assert!(approx_eq(center.x, 100.0));
    assert!(approx_eq(center.y, -50.0));
}

// =============================================================
// Smooth pan
// =============================================================

#[test]
fn ease_out_cubic_endpoints() {
    assert_eq!(ease_out_cubic(0.0), 0.0);
    assert_eq!(ease_out_cubic(1.0), 1.0);
    assert!(approx_eq(ease_out_cubic(0.5), 0.875));
    assert_eq!(ease_out_cubic(2.0), 1.0);
}

#[test]
fn smooth_pan_reaches_target() {
    let mut c = ViewportController::new();
    c.smooth_pan_to(100.0, 200.0, 300.0, 1000.0);
    assert!(c.is_animating());
    assert!(c.tick(1150.0));
    let mid = c.viewport();
    assert!(approx_eq(mid.x, 100.0 * 0.875));
    assert!(approx_eq(mid.y, 200.0 * 0.875));
    assert!(c.tick(1300.0));
    assert_eq!(c.viewport().x, 100.0);
    assert_eq!(c.viewport().y, 200.0);
    assert!(!c.is_animating());
    assert!(!c.tick(1400.0));
}

#[test]
fn smooth_pan_zero_duration_jumps() {
    let mut c = ViewportController::new();
    c.smooth_pan_to(10.0, 20.0, 0.0, 0.0);
    assert!(!c.is_animating());
    assert_eq!(c.viewport().x, 10.0);
    assert_eq!(c.viewport().y, 20.0);
}

#[test]
fn new_smooth_pan_supersedes_previous() {
    let mut c = ViewportController::new();
    c.smooth_pan_to(100.0, 0.0, 100.0, 0.0);
    c.tick(50.0);
    let x_mid = c.viewport().x;
    c.smooth_pan_to(-100.0, 0.0, 100.0, 50.0);
    let anim = c.animation().unwrap();
    assert_eq!(anim.from.x, x_mid);
    assert_eq!(anim.to.x, -100.0);
    c.tick(150.0);
    assert_eq!(c.viewport().x, -100.0);
}

#[test]
fn direct_mutation_cancels_animation() {
    let mut c = ViewportController::new();
    c.smooth_pan_to(100.0, 100.0, 300.0, 0.0);
    c.tick(100.0);
    c.pan_by(1.0, 1.0);
    assert!(!c.is_animating());
    let frozen = c.viewport();
    assert!(!c.tick(300.0));
    assert_eq!(c.viewport(), frozen);
}

#[test]
fn cancel_animation_reports_whether_running() {
    let mut c = ViewportController::new();
    assert!(!c.cancel_animation());
    c.smooth_pan_to(1.0, 1.0, 100.0, 0.0);
    assert!(c.cancel_animation());
}

#[test]
fn smooth_center_on_targets_centering_translation() {
    let mut c = controller_with_screen(200.0, 100.0);
    c.smooth_center_on(Point::new(50.0, 50.0), 100.0, 0.0);
    c.tick(100.0);
    assert!(approx_eq(c.viewport().x, 50.0));
    assert!(approx_eq(c.viewport().y, 0.0));
}

// =============================================================
// Notification
// =============================================================

#[test]
fn listeners_fire_on_each_change() {
    let mut c = ViewportController::new();
    let count = Rc::new(Cell::new(0));
    let last_zoom = Rc::new(Cell::new(0.0));
    let count_in = Rc::clone(&count);
    let zoom_in = Rc::clone(&last_zoom);
    c.subscribe(move |vp| {
        count_in.set(count_in.get() + 1);
        zoom_in.set(vp.zoom);
    });
    c.pan_by(1.0, 0.0);
    c.zoom_by_step(true);
    c.pan_by(0.0, 0.0);
    assert_eq!(count.get(), 2);
    assert!(approx_eq(last_zoom.get(), 1.0 + ZOOM_STEP));
}

#[test]
fn unsubscribe_stops_notifications() {
    let mut c = ViewportController::new();
    let count = Rc::new(Cell::new(0));
    let count_in = Rc::clone(&count);
    let id = c.subscribe(move |_| count_in.set(count_in.get() + 1));
    c.pan_by(1.0, 0.0);
    assert!(c.unsubscribe(id));
    assert!(!c.unsubscribe(id));
    c.pan_by(1.0, 0.0);
    assert_eq!(count.get(), 1);
}

#[test]
fn animation_steps_notify() {
    let mut c = ViewportController::new();
    let count = Rc::new(Cell::new(0));
    let count_in = Rc::clone(&count);
    c.subscribe(move |_| count_in.set(count_in.get() + 1));
    c.smooth_pan_to(10.0, 0.0, 100.0, 0.0);
    c.tick(50.0);
    c.tick(100.0);
    assert_eq!(count.get(), 2);
}
