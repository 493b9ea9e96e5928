//! Four-point projective rectification on top of imageproc's projections.

use glam::DVec2;
use image::{DynamicImage, Luma, Rgb};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

fn as_f32_pairs(pts: &[DVec2; 4]) -> [(f32, f32); 4] {
    pts.map(|p| (p.x as f32, p.y as f32))
}

/// Projection with `dst ~ P * src` from four correspondences.
///
/// Returns `None` when three of the points in either set are collinear.
pub fn projection_from_correspondences(src: &[DVec2; 4], dst: &[DVec2; 4]) -> Option<Projection> {
    if has_collinear_triple(src) || has_collinear_triple(dst) {
        return None;
    }
    Projection::from_control_points(as_f32_pairs(src), as_f32_pairs(dst))
}

fn has_collinear_triple(pts: &[DVec2; 4]) -> bool {
    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];
    TRIPLES.iter().any(|&(i, j, k)| {
        let area2 = (pts[j] - pts[i]).perp_dot(pts[k] - pts[i]);
        area2.abs() < 1e-9
    })
}

pub fn apply_projection(projection: &Projection, p: DVec2) -> DVec2 {
    let (x, y) = *projection * (p.x as f32, p.y as f32);
    DVec2::new(x as f64, y as f64)
}

/// Warps `src` into an `out_w x out_h` image through `projection` (source ->
/// output) with bilinear sampling. Pixels that map outside the source stay
/// black.
pub fn warp_perspective(
    src: &DynamicImage,
    projection: &Projection,
    out_w: u32,
    out_h: u32,
) -> DynamicImage {
    match src {
        DynamicImage::ImageLuma8(img) => {
            let mut out = image::GrayImage::new(out_w, out_h);
            warp_into(img, projection, Interpolation::Bilinear, Luma([0]), &mut out);
            DynamicImage::ImageLuma8(out)
        }
        other => {
            let img = other.to_rgb8();
            let mut out = image::RgbImage::new(out_w, out_h);
            warp_into(&img, projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
            DynamicImage::ImageRgb8(out)
        }
    }
}
