use glam::DVec2;
use ring_gauge::Error;
use ring_gauge::detected_points::Landmark;
use ring_gauge::geometry::{Line, distance, landmark_to_pixel};

#[test]
fn test_landmark_to_pixel_scales_both_axes() {
    let p = landmark_to_pixel(&Landmark::new(0.25, 0.5, -0.1), 300);
    assert_eq!(p, DVec2::new(75.0, 150.0));
}

#[test]
fn test_point_on_line_has_zero_distance() {
    let p = DVec2::new(12.5, -3.0);
    let q = DVec2::new(40.0, 71.25);
    let line = Line::through(p, q).unwrap();
    assert!(line.perpendicular_distance(p).unwrap().abs() < 1e-9);
    assert!(line.perpendicular_distance(q).unwrap().abs() < 1e-9);
    let mid = (p + q) / 2.0;
    assert!(line.perpendicular_distance(mid).unwrap().abs() < 1e-9);
}

#[test]
fn test_distance_is_symmetric_in_defining_points() {
    let p = DVec2::new(3.0, 4.0);
    let q = DVec2::new(-7.0, 19.0);
    let forward = Line::through(p, q).unwrap();
    let backward = Line::through(q, p).unwrap();
    for r in [DVec2::new(0.0, 0.0), DVec2::new(100.0, -20.0), DVec2::new(-5.5, 8.25)] {
        let d1 = forward.perpendicular_distance(r).unwrap();
        let d2 = backward.perpendicular_distance(r).unwrap();
        assert!((d1 - d2).abs() < 1e-9);
    }
}

#[test]
fn test_vertical_axis_distance() {
    let line = Line::through(DVec2::new(150.0, 150.0), DVec2::new(150.0, 180.0)).unwrap();
    let d = line.perpendicular_distance(DVec2::new(135.0, 180.0)).unwrap();
    assert!((d - 15.0).abs() < 1e-12);
}

#[test]
fn test_coincident_points_are_degenerate() {
    let p = DVec2::new(1.0, 1.0);
    assert!(matches!(Line::through(p, p), Err(Error::DegenerateLine)));
}

#[test]
fn test_distance() {
    assert!((distance(DVec2::new(0.0, 0.0), DVec2::new(3.0, 4.0)) - 5.0).abs() < 1e-12);
}
