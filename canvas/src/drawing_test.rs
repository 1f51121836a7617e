#![allow(clippy::float_cmp)]

use super::*;

fn setup() -> (RasterSurface, History<Snapshot>, DrawingEngine) {
    let surface = RasterSurface::new(100, 100);
    let history = History::new(surface.snapshot().unwrap());
    (surface, history, DrawingEngine::new(DrawingConfig::default()))
}

fn pencil() -> StrokeStyle {
    StrokeStyle::brush(&BrushSettings::default())
}

fn marker() -> StrokeStyle {
    StrokeStyle::brush(&BrushSettings { brush_type: BrushType::Marker, ..BrushSettings::default() })
}

fn alpha(surface: &RasterSurface, x: i64, y: i64) -> u8 {
    surface.pixel(x, y).map_or(0, |p| p[3])
}

// =============================================================
// Style resolution
// =============================================================

#[test]
fn brush_presets() {
    let p = pencil();
    assert_eq!(p.width, PENCIL_WIDTH);
    assert_eq!(p.paint.opacity, PENCIL_OPACITY);
    assert_eq!(p.paint.composite, CompositeMode::SourceOver);

    let m = marker();
    assert_eq!(m.width, MARKER_WIDTH);
    assert_eq!(m.paint.opacity, 1.0);

    let h = StrokeStyle::brush(&BrushSettings { brush_type: BrushType::Highlighter, ..BrushSettings::default() });
    assert_eq!(h.width, HIGHLIGHTER_WIDTH);
    assert_eq!(h.paint.opacity, HIGHLIGHTER_OPACITY);
    assert_eq!(h.paint.composite, CompositeMode::Multiply);
}

#[test]
fn slider_overrides_are_clamped() {
    let s = StrokeStyle::brush(&BrushSettings { size: Some(500.0), opacity: Some(0.0), ..BrushSettings::default() });
    assert_eq!(s.width, MAX_BRUSH_WIDTH);
    assert_eq!(s.paint.opacity, MIN_BRUSH_OPACITY);

    let s = StrokeStyle::brush(&BrushSettings { size: Some(12.0), opacity: Some(0.5), ..BrushSettings::default() });
    assert_eq!(s.width, 12.0);
    assert_eq!(s.paint.opacity, 0.5);
}

#[test]
fn non_finite_override_falls_back_to_preset() {
    let s = StrokeStyle::brush(&BrushSettings { size: Some(f64::NAN), ..BrushSettings::default() });
    assert_eq!(s.width, PENCIL_WIDTH);
}

#[test]
fn eraser_style_is_destination_out() {
    let e = StrokeStyle::eraser();
    assert_eq!(e.width, ERASER_WIDTH);
    assert_eq!(e.paint.composite, CompositeMode::DestinationOut);
}

#[test]
fn brush_type_serde_is_lowercase() {
    let json = serde_json::to_string(&BrushType::Highlighter).unwrap();
    assert_eq!(json, "\"highlighter\"");
    let parsed: BrushSettings = serde_json::from_str(r#"{"brush_type":"marker","size":7}"#).unwrap();
    assert_eq!(parsed.brush_type, BrushType::Marker);
    assert_eq!(parsed.size, Some(7.0));
    assert_eq!(parsed.color, Color::BLACK);
}

// =============================================================
// Stroke lifecycle
// =============================================================

#[test]
fn draw_stroke_commits_one_history_entry() {
    let (mut s, mut h, mut d) = setup();
    d.begin(&mut s, Point::new(10.0, 50.0), None, marker());
    assert!(d.is_active());
    for x in (20..=90).step_by(10) {
        d.extend(&mut s, Point::new(f64::from(x), 50.0), None);
    }
    assert_eq!(d.end(&mut s, &mut h), Some(StrokeOutcome::Recorded));
    assert!(!d.is_active());
    assert_eq!(h.len(), 2);
    assert_eq!(h.current_step(), 1);
    assert!(h.can_undo());
    assert!(!h.can_redo());
    assert_eq!(alpha(&s, 50, 50), 255);
}

#[test]
fn rendering_is_progressive() {
    let (mut s, _, mut d) = setup();
    d.begin(&mut s, Point::new(10.0, 50.0), None, marker());
    d.extend(&mut s, Point::new(30.0, 50.0), None);
    d.extend(&mut s, Point::new(50.0, 50.0), None);
    assert_eq!(alpha(&s, 25, 50), 255);
}

#[test]
fn tap_leaves_a_dot() {
    let (mut s, mut h, mut d) = setup();
    d.begin(&mut s, Point::new(40.0, 40.0), None, marker());
    d.end(&mut s, &mut h);
    assert_eq!(alpha(&s, 40, 40), 255);
    assert_eq!(h.len(), 2);
}

#[test]
fn end_when_idle_is_noop() {
    let (mut s, mut h, mut d) = setup();
    assert_eq!(d.end(&mut s, &mut h), None);
    assert_eq!(h.len(), 1);
}

#[test]
fn erasing_blank_space_adds_no_history() {
    let (mut s, mut h, mut d) = setup();
    d.begin(&mut s, Point::new(20.0, 20.0), None, StrokeStyle::eraser());
    d.extend(&mut s, Point::new(60.0, 60.0), None);
    assert_eq!(d.end(&mut s, &mut h), Some(StrokeOutcome::Unchanged));
    assert_eq!(h.len(), 1);
    assert!(!h.can_undo());
}

#[test]
fn stroke_beyond_bitmap_grows_it_and_records() {
    let (mut s, mut h, mut d) = setup();
    d.begin(&mut s, Point::new(-80.0, 50.0), None, marker());
    d.extend(&mut s, Point::new(-20.0, 50.0), None);
    d.extend(&mut s, Point::new(150.0, 50.0), None);
    assert_eq!(d.end(&mut s, &mut h), Some(StrokeOutcome::Recorded));
    assert!(s.origin().0 < -80);
    assert_eq!(alpha(&s, -60, 50), 255);
    assert_eq!(alpha(&s, 140, 50), 255);
    assert_eq!(h.current().map(Snapshot::origin), Some(s.origin()));
}

#[test]
fn extend_when_idle_is_noop() {
    let (mut s, _, mut d) = setup();
    assert!(!d.extend(&mut s, Point::new(5.0, 5.0), None));
    assert!(s.is_blank());
}

#[test]
fn repeated_point_is_skipped() {
    let (mut s, _, mut d) = setup();
    d.begin(&mut s, Point::new(5.0, 5.0), None, pencil());
    assert!(d.extend(&mut s, Point::new(6.0, 5.0), None));
    assert!(!d.extend(&mut s, Point::new(6.0, 5.0), None));
    assert_eq!(d.point_count(), 2);
}

#[test]
fn smooth_stroke_closes_tail_on_end() {
    let (mut s, mut h, mut d) = setup();
    d.begin(&mut s, Point::new(10.0, 50.0), None, marker());
    d.extend(&mut s, Point::new(50.0, 50.0), None);
    d.extend(&mut s, Point::new(90.0, 50.0), None);
    // Live rendering stops at the last midpoint.
    assert_eq!(alpha(&s, 85, 50), 0);
    d.end(&mut s, &mut h);
    assert_eq!(alpha(&s, 85, 50), 255);
}

#[test]
fn straight_mode_paints_full_segment_immediately() {
    let (mut s, _, _) = setup();
    let mut d = DrawingEngine::new(DrawingConfig { smooth_live: false, pressure_sensitive: false });
    d.begin(&mut s, Point::new(10.0, 50.0), None, marker());
    d.extend(&mut s, Point::new(90.0, 50.0), None);
    assert_eq!(alpha(&s, 85, 50), 255);
}

#[test]
fn cancel_restores_pixels_without_history() {
    let (mut s, h, mut d) = setup();
    d.begin(&mut s, Point::new(10.0, 10.0), None, marker());
    d.extend(&mut s, Point::new(80.0, 80.0), None);
    assert!(d.cancel(&mut s));
    assert!(s.is_blank());
    assert_eq!(h.len(), 1);
    assert!(!d.cancel(&mut s));
}

#[test]
fn eraser_clears_committed_ink() {
    let (mut s, mut h, mut d) = setup();
    d.begin(&mut s, Point::new(10.0, 50.0), None, marker());
    d.extend(&mut s, Point::new(90.0, 50.0), None);
    d.end(&mut s, &mut h);
    d.begin(&mut s, Point::new(50.0, 20.0), None, StrokeStyle::eraser());
    d.extend(&mut s, Point::new(50.0, 80.0), None);
    d.end(&mut s, &mut h);
    assert_eq!(alpha(&s, 50, 50), 0);
    assert_eq!(alpha(&s, 20, 50), 255);
    assert_eq!(h.len(), 3);
}

// =============================================================
// Pressure
// =============================================================

#[test]
fn pressure_scales_width() {
    let d = DrawingEngine::new(DrawingConfig { smooth_live: false, pressure_sensitive: true });
    assert_eq!(d.radius(10.0, Some(0.5)), 2.5);
    assert_eq!(d.radius(10.0, None), 5.0);
    assert_eq!(d.radius(10.0, Some(0.0)), 5.0);
    assert_eq!(d.radius(10.0, Some(3.0)), 5.0);
}

#[test]
fn pressure_never_goes_below_min_width() {
    let d = DrawingEngine::new(DrawingConfig::default());
    assert_eq!(d.radius(2.0, Some(0.01)), MIN_BRUSH_WIDTH * 0.5);
}

#[test]
fn pressure_ignored_when_disabled() {
    let d = DrawingEngine::new(DrawingConfig { smooth_live: true, pressure_sensitive: false });
    assert_eq!(d.radius(10.0, Some(0.2)), 5.0);
}

// =============================================================
// Curve helper
// =============================================================

#[test]
fn quadratic_endpoints_and_straight_line() {
    let a = Point::new(0.0, 0.0);
    let c = Point::new(5.0, 0.0);
    let b = Point::new(10.0, 0.0);
    assert_eq!(quadratic_point(a, c, b, 0.0), a);
    assert_eq!(quadratic_point(a, c, b, 1.0), b);
    let mid = quadratic_point(a, c, b, 0.5);
    assert_eq!(mid, Point::new(5.0, 0.0));
}
