//! Pixel-space geometry shared by the calibration strategies, the card
//! detector and the measurement engine.

use glam::DVec2;

use crate::detected_points::Landmark;
use crate::error::{Error, Result};

/// Maps a normalized landmark onto a square frame of `frame_side` pixels.
pub fn landmark_to_pixel(landmark: &Landmark, frame_side: u32) -> DVec2 {
    let s = frame_side as f64;
    DVec2::new(landmark.x * s, landmark.y * s)
}

pub fn distance(p: DVec2, q: DVec2) -> f64 {
    p.distance(q)
}

/// Line `a * x + b * y + c = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Line {
    pub fn through(p: DVec2, q: DVec2) -> Result<Line> {
        if p == q {
            return Err(Error::DegenerateLine);
        }
        let a = q.y - p.y;
        let b = p.x - q.x;
        let c = q.x * p.y - p.x * q.y;
        Ok(Line { a, b, c })
    }

    pub fn perpendicular_distance(&self, point: DVec2) -> Result<f64> {
        let denom = (self.a * self.a + self.b * self.b).sqrt();
        if denom == 0.0 {
            return Err(Error::DegenerateLine);
        }
        Ok((self.a * point.x + self.b * point.y + self.c).abs() / denom)
    }
}

pub fn perimeter(points: &[DVec2], closed: bool) -> f64 {
    let open: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    match (closed, points.first(), points.last()) {
        (true, Some(first), Some(last)) if points.len() > 2 => open + last.distance(*first),
        _ => open,
    }
}

/// Douglas-Peucker simplification of an open polyline; keeps both endpoints.
fn simplify_open(points: &[DVec2], epsilon: f64, out: &mut Vec<DVec2>) {
    let (first, last) = (points[0], points[points.len() - 1]);
    let mut farthest = (0, 0.0);
    for (i, p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let d = match Line::through(first, last) {
            Ok(line) => line.perpendicular_distance(*p).unwrap_or(0.0),
            // closed-loop chunks can start and end on the same pixel
            Err(_) => first.distance(*p),
        };
        if d > farthest.1 {
            farthest = (i, d);
        }
    }
    if farthest.1 > epsilon {
        simplify_open(&points[..=farthest.0], epsilon, out);
        out.pop();
        simplify_open(&points[farthest.0..], epsilon, out);
    } else {
        out.push(first);
        out.push(last);
    }
}

fn farthest_from(points: &[DVec2], origin: DVec2) -> usize {
    points
        .iter()
        .enumerate()
        .fold((0, 0.0), |best, (i, p)| {
            let d = origin.distance(*p);
            if d > best.1 { (i, d) } else { best }
        })
        .0
}

/// Simplifies a closed contour to a polygon within `epsilon` pixels.
///
/// The contour is cut at two extreme points, `a` farthest from the first
/// point and `b` farthest from `a`, and each of the two chains is simplified
/// on its own. Where the contour starts does not matter. The closing vertex is
/// not repeated.
pub fn approximate_closed_polygon(points: &[DVec2], epsilon: f64) -> Vec<DVec2> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    if a == b {
        return vec![points[a]];
    }
    let (lo, hi) = (a.min(b), a.max(b));

    let mut wrapped: Vec<DVec2> = points[hi..].to_vec();
    wrapped.extend_from_slice(&points[..=lo]);

    let mut polygon = Vec::new();
    simplify_open(&points[lo..=hi], epsilon, &mut polygon);
    polygon.pop();
    simplify_open(&wrapped, epsilon, &mut polygon);
    polygon.pop();
    polygon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_through_horizontal_points() {
        let line = Line::through(DVec2::new(0.0, 2.0), DVec2::new(5.0, 2.0)).unwrap();
        let d = line.perpendicular_distance(DVec2::new(3.0, 7.0)).unwrap();
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn zero_coefficients_are_degenerate() {
        let line = Line { a: 0.0, b: 0.0, c: 1.0 };
        assert!(matches!(
            line.perpendicular_distance(DVec2::ZERO),
            Err(Error::DegenerateLine)
        ));
    }

    #[test]
    fn perimeter_of_unit_square() {
        let square = [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ];
        assert!((perimeter(&square, true) - 4.0).abs() < 1e-12);
        assert!((perimeter(&square, false) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn dense_rectangle_contour_collapses_to_four_corners() {
        let mut contour = Vec::new();
        for x in 10..=90 {
            contour.push(DVec2::new(x as f64, 20.0));
        }
        for y in 21..=70 {
            contour.push(DVec2::new(90.0, y as f64));
        }
        for x in (10..90).rev() {
            contour.push(DVec2::new(x as f64, 70.0));
        }
        for y in (21..70).rev() {
            contour.push(DVec2::new(10.0, y as f64));
        }
        let eps = 0.02 * perimeter(&contour, true);
        let polygon = approximate_closed_polygon(&contour, eps);
        assert_eq!(polygon.len(), 4, "{:?}", polygon);
        for corner in [
            DVec2::new(10.0, 20.0),
            DVec2::new(90.0, 20.0),
            DVec2::new(90.0, 70.0),
            DVec2::new(10.0, 70.0),
        ] {
            assert!(polygon.iter().any(|p| p.distance(corner) < 1e-9));
        }
    }

    #[test]
    fn contour_starting_mid_edge_keeps_four_corners() {
        let mut contour = Vec::new();
        for x in 10..=90 {
            contour.push(DVec2::new(x as f64, 20.0));
        }
        for y in 21..=70 {
            contour.push(DVec2::new(90.0, y as f64));
        }
        for x in (10..90).rev() {
            contour.push(DVec2::new(x as f64, 70.0));
        }
        for y in (21..70).rev() {
            contour.push(DVec2::new(10.0, y as f64));
        }
        let eps = 0.02 * perimeter(&contour, true);
        for shift in [1, 40, 81, 100, 150, contour.len() - 1] {
            let mut rotated = contour.clone();
            rotated.rotate_left(shift);
            let polygon = approximate_closed_polygon(&rotated, eps);
            assert_eq!(polygon.len(), 4, "shift {}: {:?}", shift, polygon);
            for corner in [
                DVec2::new(10.0, 20.0),
                DVec2::new(90.0, 20.0),
                DVec2::new(90.0, 70.0),
                DVec2::new(10.0, 70.0),
            ] {
                assert!(polygon.contains(&corner), "shift {}: {:?}", shift, polygon);
            }
        }
    }
}
