#![allow(clippy::float_cmp)]

use super::*;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn style() -> ElementStyle {
    ElementStyle { color: Color::BLACK, brush_type: BrushType::Pencil, line_width: 2.0, opacity: 1.0 }
}

fn element(points: &[(f64, f64)]) -> DrawingElement {
    DrawingElement::new(points.iter().map(|&(x, y)| pt(x, y)).collect(), &style())
}

fn add(m: &mut ElementManager, points: &[(f64, f64)]) -> ElementId {
    m.start_stroke(pt(points[0].0, points[0].1));
    for &(x, y) in &points[1..] {
        m.add_point(pt(x, y));
    }
    m.finish_stroke(&style()).unwrap()
}

fn assert_bounds_consistent(e: &DrawingElement) {
    let min_x = e.points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = e.points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_x = e.points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let max_y = e.points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(e.x, min_x);
    assert_eq!(e.y, min_y);
    assert_eq!(e.width, max_x - min_x);
    assert_eq!(e.height, max_y - min_y);
}

// =============================================================
// Smoothing
// =============================================================

#[test]
fn smoothing_keeps_straight_line() {
    let line: Vec<Point> = (0..6).map(|i| pt(f64::from(i) * 10.0, f64::from(i) * 5.0)).collect();
    assert_eq!(smooth_points(&line), line);
}

#[test]
fn smoothing_pulls_in_spike_and_keeps_endpoints() {
    let pts = [pt(0.0, 0.0), pt(10.0, 8.0), pt(20.0, 0.0)];
    let out = smooth_points(&pts);
    assert_eq!(out[0], pts[0]);
    assert_eq!(out[2], pts[2]);
    assert_eq!(out[1], pt(10.0, 4.0));
}

#[test]
fn smoothing_short_input_unchanged() {
    let pts = [pt(1.0, 2.0), pt(3.0, 4.0)];
    assert_eq!(smooth_points(&pts), pts.to_vec());
    assert!(smooth_points(&[]).is_empty());
}

// =============================================================
// Element geometry
// =============================================================

#[test]
fn new_element_derives_bounds() {
    let e = element(&[(10.0, 20.0), (30.0, 5.0), (15.0, 40.0)]);
    assert_eq!(e.bounds(), Rect::new(10.0, 5.0, 20.0, 35.0));
}

#[test]
fn transforms_keep_bounds_consistent() {
    let mut e = element(&[(10.0, 20.0), (30.0, 5.0), (15.0, 40.0), (-3.0, 12.5)]);
    e.translate(7.0, -2.0);
    assert_bounds_consistent(&e);
    e.flip(FlipAxis::Horizontal);
    assert_bounds_consistent(&e);
    e.flip(FlipAxis::Vertical);
    assert_bounds_consistent(&e);
    assert!(e.scale(1.75));
    assert_bounds_consistent(&e);
}

#[test]
fn flip_keeps_center() {
    let mut e = element(&[(0.0, 0.0), (10.0, 2.0), (4.0, 8.0)]);
    let before = e.center();
    e.flip(FlipAxis::Horizontal);
    assert_eq!(e.center(), before);
    assert_eq!(e.points[1], pt(0.0, 2.0));
}

#[test]
fn scale_about_center() {
    let mut e = element(&[(0.0, 0.0), (10.0, 10.0)]);
    assert!(e.scale(2.0));
    assert_eq!(e.bounds(), Rect::new(-5.0, -5.0, 20.0, 20.0));
}

#[test]
fn invalid_scale_ignored() {
    let mut e = element(&[(0.0, 0.0), (10.0, 10.0)]);
    assert!(!e.scale(0.0));
    assert!(!e.scale(-1.0));
    assert!(!e.scale(f64::NAN));
    assert!(!e.scale(f64::INFINITY));
    assert_eq!(e.bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
}

// =============================================================
// Hit testing
// =============================================================

#[test]
fn hit_near_segment() {
    let e = element(&[(0.0, 0.0), (100.0, 0.0)]);
    assert!(e.hit(pt(50.0, 5.0), 5.0));
    assert!(!e.hit(pt(50.0, 7.0), 5.0));
}

#[test]
fn hit_uses_segments_not_box() {
    let e = element(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]);
    assert!(e.bounds().contains_with_margin(pt(20.0, 80.0), 0.0));
    assert!(!e.hit(pt(20.0, 80.0), 5.0));
}

#[test]
fn hit_single_point_element() {
    let e = element(&[(10.0, 10.0)]);
    assert!(e.hit(pt(12.0, 10.0), 2.0));
    assert!(!e.hit(pt(20.0, 10.0), 2.0));
}

#[test]
fn point_segment_distance_clamps_to_ends() {
    let d = point_segment_distance(pt(-3.0, 4.0), pt(0.0, 0.0), pt(10.0, 0.0));
    assert_eq!(d, 5.0);
    let d = point_segment_distance(pt(5.0, 3.0), pt(0.0, 0.0), pt(10.0, 0.0));
    assert_eq!(d, 3.0);
}

#[test]
fn manager_hit_test_prefers_topmost_and_scales_margin() {
    let mut m = ElementManager::new();
    let bottom = add(&mut m, &[(0.0, 0.0), (100.0, 0.0)]);
    let top = add(&mut m, &[(0.0, 2.0), (100.0, 2.0)]);
    assert_eq!(m.hit_test(pt(50.0, 1.0), 1.0), Some(top));
    assert_ne!(m.hit_test(pt(50.0, 1.0), 1.0), Some(bottom));
    // 5 screen px at zoom 0.5 is 10 world units.
    assert_eq!(m.hit_test(pt(50.0, 12.0), 0.5), Some(top));
    assert_eq!(m.hit_test(pt(50.0, 12.0), 1.0), None);
}

// =============================================================
// Capture
// =============================================================

#[test]
fn capture_smooths_on_finish() {
    let mut m = ElementManager::new();
    let id = add(&mut m, &[(0.0, 0.0), (10.0, 8.0), (20.0, 0.0)]);
    let e = m.element(&id).unwrap();
    assert_eq!(e.points[1], pt(10.0, 4.0));
    assert!(!m.is_capturing());
}

#[test]
fn add_point_when_idle_is_noop() {
    let mut m = ElementManager::new();
    assert!(!m.add_point(pt(1.0, 1.0)));
    assert!(m.finish_stroke(&style()).is_none());
    assert!(m.is_empty());
}

#[test]
fn cancel_stroke_discards_points() {
    let mut m = ElementManager::new();
    m.start_stroke(pt(0.0, 0.0));
    m.add_point(pt(5.0, 5.0));
    assert_eq!(m.pending_points().len(), 2);
    assert!(m.cancel_stroke());
    assert!(m.pending_points().is_empty());
    assert!(m.is_empty());
}

#[test]
fn style_from_brush_uses_presets() {
    let s = ElementStyle::from_brush(&BrushSettings { brush_type: BrushType::Highlighter, ..BrushSettings::default() });
    assert_eq!(s.line_width, crate::consts::HIGHLIGHTER_WIDTH);
    assert_eq!(s.opacity, crate::consts::HIGHLIGHTER_OPACITY);
}

// =============================================================
// Selection and batch transforms
// =============================================================

#[test]
fn select_is_single() {
    let mut m = ElementManager::new();
    let a = add(&mut m, &[(0.0, 0.0), (10.0, 0.0)]);
    let b = add(&mut m, &[(0.0, 50.0), (10.0, 50.0)]);
    assert!(m.select(&a));
    assert!(m.select(&b));
    assert_eq!(m.selected_ids(), vec![b]);
    assert!(!m.select(&Uuid::new_v4()));
    assert_eq!(m.selected_ids(), vec![b]);
}

#[test]
fn select_all_and_clear() {
    let mut m = ElementManager::new();
    add(&mut m, &[(0.0, 0.0), (10.0, 0.0)]);
    add(&mut m, &[(0.0, 50.0), (10.0, 50.0)]);
    m.select_all();
    assert_eq!(m.selected_ids().len(), 2);
    assert!(m.clear_selection());
    assert!(!m.clear_selection());
    assert!(!m.has_selection());
}

#[test]
fn move_selected_only_moves_selection() {
    let mut m = ElementManager::new();
    let a = add(&mut m, &[(0.0, 0.0), (10.0, 0.0)]);
    let b = add(&mut m, &[(0.0, 50.0), (10.0, 50.0)]);
    m.select(&a);
    assert!(m.move_selected(5.0, 5.0));
    assert_eq!(m.element(&a).unwrap().x, 5.0);
    assert_eq!(m.element(&b).unwrap().x, 0.0);
}

#[test]
fn move_all_moves_everything() {
    let mut m = ElementManager::new();
    let a = add(&mut m, &[(0.0, 0.0), (10.0, 0.0)]);
    let b = add(&mut m, &[(0.0, 50.0), (10.0, 50.0)]);
    assert!(m.move_all(3.0, 4.0));
    assert_eq!(m.element(&a).unwrap().y, 4.0);
    assert_eq!(m.element(&b).unwrap().y, 54.0);
}

#[test]
fn duplicate_offsets_copy_and_selects_it() {
    let mut m = ElementManager::new();
    let a = add(&mut m, &[(0.0, 0.0), (10.0, 10.0)]);
    m.select(&a);
    let copies = m.duplicate_selected();
    assert_eq!(copies.len(), 1);
    assert_ne!(copies[0], a);
    let c = m.element(&copies[0]).unwrap();
    assert_eq!((c.x, c.y), (DUPLICATE_OFFSET, DUPLICATE_OFFSET));
    assert!(c.is_selected);
    assert!(!m.is_selected(&a));
    assert_eq!(m.len(), 2);
}

#[test]
fn duplicate_without_selection_is_noop() {
    let mut m = ElementManager::new();
    add(&mut m, &[(0.0, 0.0), (10.0, 10.0)]);
    assert!(m.duplicate_selected().is_empty());
    assert_eq!(m.len(), 1);
}

#[test]
fn delete_selected_removes_and_reports() {
    let mut m = ElementManager::new();
    let a = add(&mut m, &[(0.0, 0.0), (10.0, 10.0)]);
    let b = add(&mut m, &[(50.0, 0.0), (60.0, 10.0)]);
    m.select(&a);
    assert_eq!(m.delete_selected(), vec![a]);
    assert!(m.element(&a).is_none());
    assert!(m.element(&b).is_some());
}

#[test]
fn recolor_and_flip_selected() {
    let mut m = ElementManager::new();
    let a = add(&mut m, &[(0.0, 0.0), (10.0, 4.0)]);
    assert!(!m.recolor_selected(Color::WHITE));
    m.select(&a);
    assert!(m.recolor_selected(Color::WHITE));
    assert!(m.flip_selected(FlipAxis::Vertical));
    let e = m.element(&a).unwrap();
    assert_eq!(e.color, Color::WHITE);
    assert_eq!(e.points[0], pt(0.0, 4.0));
    assert_bounds_consistent(e);
}

#[test]
fn scale_selected_rejects_bad_factor() {
    let mut m = ElementManager::new();
    let a = add(&mut m, &[(0.0, 0.0), (10.0, 10.0)]);
    m.select(&a);
    assert!(!m.scale_selected(-2.0));
    assert!(m.scale_selected(0.5));
    assert_eq!(m.element(&a).unwrap().width, 5.0);
}

// =============================================================
// Organize / auto-group
// =============================================================

#[test]
fn organize_places_on_grid() {
    let mut m = ElementManager::new();
    let ids: Vec<ElementId> = [
        [(100.0, 100.0), (120.0, 110.0)],
        [(300.0, 50.0), (310.0, 90.0)],
        [(500.0, 500.0), (505.0, 505.0)],
        [(0.0, 400.0), (30.0, 400.0)],
        [(250.0, 250.0), (260.0, 260.0)],
    ]
    .iter()
    .map(|p| add(&mut m, p))
    .collect();
    assert!(m.organize());
    // origin is (0, 50); largest dimension 40 -> cell 80; 3 columns.
    let at = |id: &ElementId| {
        let e = m.element(id).unwrap();
        (e.x, e.y)
    };
    assert_eq!(at(&ids[0]), (0.0, 50.0));
    assert_eq!(at(&ids[1]), (80.0, 50.0));
    assert_eq!(at(&ids[2]), (160.0, 50.0));
    assert_eq!(at(&ids[3]), (0.0, 130.0));
    assert_eq!(at(&ids[4]), (80.0, 130.0));
    for e in m.iter() {
        assert_bounds_consistent(e);
    }
}

#[test]
fn organize_empty_is_noop() {
    let mut m = ElementManager::new();
    assert!(!m.organize());
}

#[test]
fn auto_group_single_linkage() {
    let mut m = ElementManager::new();
    let a = add(&mut m, &[(0.0, 0.0), (10.0, 0.0)]);
    let far = add(&mut m, &[(1000.0, 0.0), (1010.0, 0.0)]);
    let b = add(&mut m, &[(80.0, 0.0), (90.0, 0.0)]);
    // c joins a's cluster through b even though it is 160 from a.
    let c = add(&mut m, &[(160.0, 0.0), (170.0, 0.0)]);
    let d = add(&mut m, &[(1050.0, 0.0), (1060.0, 0.0)]);
    let lone = add(&mut m, &[(5000.0, 0.0), (5010.0, 0.0)]);

    assert_eq!(m.auto_group(100.0), 2);
    let g = |id: &ElementId| m.element(id).unwrap().group_id;
    assert_eq!(g(&a), Some(1));
    assert_eq!(g(&b), Some(1));
    assert_eq!(g(&c), Some(1));
    assert_eq!(g(&far), Some(2));
    assert_eq!(g(&d), Some(2));
    assert_eq!(g(&lone), None);
}

#[test]
fn auto_group_is_deterministic() {
    let build = || {
        let mut m = ElementManager::new();
        for i in 0..8 {
            let x = f64::from(i) * 70.0 * f64::from(i % 3);
            add(&mut m, &[(x, 0.0), (x + 5.0, 5.0)]);
        }
        m.auto_group(100.0);
        m.iter().map(|e| e.group_id).collect::<Vec<_>>()
    };
    assert_eq!(build(), build());
}
