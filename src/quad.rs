//! Reference-card detection.
//!
//! Finds a card-shaped quadrilateral in a capture, canonicalizes its corners
//! and rectifies it so that its horizontal extent corresponds to the known
//! card width.
//!
//! Candidate selection is first-match: contours are visited in discovery
//! order and the first 4-vertex polygon whose bounding box has an acceptable
//! aspect ratio wins, even if a later candidate is closer to the ideal card
//! ratio.

use glam::DVec2;
use image::DynamicImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::Projection;
use imageproc::morphology::dilate;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{approximate_closed_polygon, perimeter};
use crate::perspective::{projection_from_correspondences, warp_perspective};

/// Width / height of an ID-1 card (85.60 x 53.98 mm).
pub const ID1_CARD_ASPECT: f64 = 85.6 / 53.98;

/// Card detector tuning.
///
/// There is no minimum-area filter: with first-match selection any small
/// 4-vertex contour in the aspect range found before the card wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CardDetectorConfig {
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Chebyshev radius used to close one-pixel gaps in the edge map, 0 disables.
    pub edge_dilation: u8,
    /// Polygon tolerance as a fraction of the contour perimeter.
    pub epsilon_fraction: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
}

impl Default for CardDetectorConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,
            edge_dilation: 1,
            epsilon_fraction: 0.02,
            min_aspect: 1.4,
            max_aspect: 1.8,
        }
    }
}

impl CardDetectorConfig {
    pub fn accepts_aspect(&self, aspect: f64) -> bool {
        aspect >= self.min_aspect && aspect <= self.max_aspect
    }
}

/// Four corners ordered top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    corners: [DVec2; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadEdges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Quad {
    /// Canonicalizes corners given in any order: the two smallest y form the
    /// top pair, each pair is then ordered by x.
    pub fn from_corners(mut corners: [DVec2; 4]) -> Quad {
        corners.sort_by(|p, q| p.y.total_cmp(&q.y));
        let (mut top, mut bottom) = ([corners[0], corners[1]], [corners[2], corners[3]]);
        top.sort_by(|p, q| p.x.total_cmp(&q.x));
        bottom.sort_by(|p, q| p.x.total_cmp(&q.x));
        Quad {
            corners: [top[0], top[1], bottom[1], bottom[0]],
        }
    }

    pub fn corners(&self) -> &[DVec2; 4] {
        &self.corners
    }

    pub fn top_left(&self) -> DVec2 {
        self.corners[0]
    }

    pub fn top_right(&self) -> DVec2 {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> DVec2 {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> DVec2 {
        self.corners[3]
    }

    pub fn edges(&self) -> QuadEdges {
        QuadEdges {
            top: self.top_left().distance(self.top_right()),
            right: self.top_right().distance(self.bottom_right()),
            bottom: self.bottom_right().distance(self.bottom_left()),
            left: self.bottom_left().distance(self.top_left()),
        }
    }

    /// Size of the axis-aligned rectangle the quad is rectified to.
    pub fn rectified_size(&self) -> (f64, f64) {
        let e = self.edges();
        (e.top.max(e.bottom), e.left.max(e.right))
    }

    pub fn projection_to_rectified(&self) -> Option<Projection> {
        let (w, h) = self.rectified_size();
        let dst = [
            DVec2::new(0.0, 0.0),
            DVec2::new(w, 0.0),
            DVec2::new(w, h),
            DVec2::new(0.0, h),
        ];
        projection_from_correspondences(&self.corners, &dst)
    }
}

/// Width / height of the axis-aligned bounding box.
pub fn bounding_box_aspect(points: &[DVec2]) -> Option<f64> {
    let first = points.first()?;
    let (min, max) = points
        .iter()
        .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
    let size = max - min;
    if size.y <= 0.0 {
        None
    } else {
        Some(size.x / size.y)
    }
}

/// First candidate, in the given order, that is a 4-gon with an accepted
/// bounding-box aspect ratio.
pub fn select_card_quad(candidates: &[Vec<DVec2>], config: &CardDetectorConfig) -> Option<Quad> {
    for (i, polygon) in candidates.iter().enumerate() {
        let Ok(corners) = <[DVec2; 4]>::try_from(polygon.as_slice()) else {
            continue;
        };
        let Some(aspect) = bounding_box_aspect(&corners) else {
            continue;
        };
        trace!("candidate {} aspect {:.3}", i, aspect);
        if config.accepts_aspect(aspect) {
            debug!("accepted candidate {} with aspect {:.3}", i, aspect);
            return Some(Quad::from_corners(corners));
        }
    }
    None
}

/// Blurred, Canny and optionally dilated edge map of the frame.
pub fn edge_map(image: &DynamicImage, config: &CardDetectorConfig) -> image::GrayImage {
    let gray = image.to_luma8();
    let blurred = if config.blur_sigma > 0.0 {
        gaussian_blur_f32(&gray, config.blur_sigma)
    } else {
        gray
    };
    let edges = canny(&blurred, config.canny_low, config.canny_high);
    if config.edge_dilation > 0 {
        dilate(&edges, Norm::LInf, config.edge_dilation)
    } else {
        edges
    }
}

/// Polygonal approximations of the outermost contours, in discovery order.
pub fn contour_polygons(edges: &image::GrayImage, config: &CardDetectorConfig) -> Vec<Vec<DVec2>> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let points: Vec<DVec2> = c
                .points
                .iter()
                .map(|p| DVec2::new(p.x as f64, p.y as f64))
                .collect();
            let eps = config.epsilon_fraction * perimeter(&points, true);
            if eps <= 0.0 {
                return None;
            }
            Some(approximate_closed_polygon(&points, eps))
        })
        .collect()
}

pub fn detect_card_quad(image: &DynamicImage, config: &CardDetectorConfig) -> Result<Quad> {
    let edges = edge_map(image, config);
    let polygons = contour_polygons(&edges, config);
    debug!(
        "{} outer contours, {} quadrilaterals",
        polygons.len(),
        polygons.iter().filter(|p| p.len() == 4).count()
    );
    select_card_quad(&polygons, config).ok_or_else(|| {
        warn!("no card-shaped quadrilateral in {}x{} frame", image.width(), image.height());
        Error::ReferenceNotFound
    })
}

/// A detected card warped to an axis-aligned rectangle.
#[derive(Debug, Clone)]
pub struct RectifiedCard {
    pub quad: Quad,
    /// Rectified width in pixels, `max(top edge, bottom edge)`.
    pub width_px: f64,
    pub height_px: f64,
    pub projection: Projection,
    pub image: DynamicImage,
}

pub fn rectify_card(image: &DynamicImage, quad: Quad) -> Result<RectifiedCard> {
    let (width_px, height_px) = quad.rectified_size();
    let projection = quad
        .projection_to_rectified()
        .ok_or(Error::ReferenceNotFound)?;
    let out_w = (width_px.round() as u32).max(1);
    let out_h = (height_px.round() as u32).max(1);
    let warped = warp_perspective(image, &projection, out_w, out_h);
    info!(
        "card rectified to {}x{} px from corners {:?}",
        out_w,
        out_h,
        quad.corners()
    );
    Ok(RectifiedCard {
        quad,
        width_px,
        height_px,
        projection,
        image: warped,
    })
}

#[derive(Debug, Clone, Default)]
pub struct CardDetector {
    pub config: CardDetectorConfig,
}

impl CardDetector {
    pub fn new(config: CardDetectorConfig) -> CardDetector {
        CardDetector { config }
    }

    pub fn detect(&self, image: &DynamicImage) -> Result<RectifiedCard> {
        let quad = detect_card_quad(image, &self.config)?;
        rectify_card(image, quad)
    }
}
