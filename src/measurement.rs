//! Finger width from landmark geometry.

use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationMethod, CalibrationResult};
use crate::detected_points::{HandDetection, HandLandmark, HandLandmarks};
use crate::error::{Error, Result};
use crate::geometry::{Line, distance, landmark_to_pixel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthMode {
    /// Mean distance of the middle and index PIP joints to the ring finger
    /// axis (MCP -> PIP), orthogonal to the finger so hand rotation cancels.
    #[default]
    AxisPerpendicular,
    /// Mean of the ring-middle and middle-index PIP spans.
    AdjacentPip,
}

/// Where the confidence percentage comes from.
///
/// Both are pass-through detector signals. The prototypes disagree on which
/// one to show, so the choice is left to configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    Handedness,
    /// Mean landmark z, world landmarks preferred.
    MeanDepth,
    #[default]
    HandednessThenDepth,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    pub width_mode: WidthMode,
    pub confidence_source: ConfidenceSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    finger_width_mm: f64,
    confidence_percent: Option<f64>,
    ring_finger_length_mm: f64,
    width_mode: WidthMode,
    method: CalibrationMethod,
    mm_per_pixel: f64,
}

impl Measurement {
    pub fn finger_width_mm(&self) -> f64 {
        self.finger_width_mm
    }

    pub fn finger_width_cm(&self) -> f64 {
        self.finger_width_mm / 10.0
    }

    /// Circumference of a circular finger section with the measured width.
    pub fn circumference_mm(&self) -> f64 {
        self.finger_width_mm * PI
    }

    pub fn confidence_percent(&self) -> Option<f64> {
        self.confidence_percent
    }

    /// MCP -> PIP -> DIP -> TIP polyline length.
    pub fn ring_finger_length_mm(&self) -> f64 {
        self.ring_finger_length_mm
    }

    pub fn width_mode(&self) -> WidthMode {
        self.width_mode
    }

    pub fn method(&self) -> CalibrationMethod {
        self.method
    }

    pub fn mm_per_pixel(&self) -> f64 {
        self.mm_per_pixel
    }
}

fn pixel(landmarks: &HandLandmarks, which: HandLandmark, frame_side: u32) -> glam::DVec2 {
    landmark_to_pixel(&landmarks.get(which), frame_side)
}

pub fn finger_width_px(landmarks: &HandLandmarks, frame_side: u32, mode: WidthMode) -> Result<f64> {
    let ring_pip = pixel(landmarks, HandLandmark::RingPip, frame_side);
    let middle_pip = pixel(landmarks, HandLandmark::MiddlePip, frame_side);
    let index_pip = pixel(landmarks, HandLandmark::IndexPip, frame_side);
    match mode {
        WidthMode::AxisPerpendicular => {
            let ring_mcp = pixel(landmarks, HandLandmark::RingMcp, frame_side);
            let axis = Line::through(ring_mcp, ring_pip)?;
            let d_middle = axis.perpendicular_distance(middle_pip)?;
            let d_index = axis.perpendicular_distance(index_pip)?;
            Ok((d_middle + d_index) / 2.0)
        }
        WidthMode::AdjacentPip => {
            let ring_to_middle = distance(ring_pip, middle_pip);
            let middle_to_index = distance(middle_pip, index_pip);
            Ok((ring_to_middle + middle_to_index) / 2.0)
        }
    }
}

pub fn ring_finger_length_px(landmarks: &HandLandmarks, frame_side: u32) -> f64 {
    HandLandmark::RING_FINGER
        .windows(2)
        .map(|w| {
            distance(
                pixel(landmarks, w[0], frame_side),
                pixel(landmarks, w[1], frame_side),
            )
        })
        .sum()
}

/// Detector quality signal as a percentage, `None` when the selected source
/// is missing.
pub fn confidence_percent(detection: &HandDetection, source: ConfidenceSource) -> Option<f64> {
    let handedness = || detection.handedness_score.map(|s| s * 100.0);
    let depth = || {
        let landmarks = detection
            .world_landmarks
            .as_ref()
            .unwrap_or(&detection.landmarks);
        Some(landmarks.mean_depth() * 100.0)
    };
    let raw = match source {
        ConfidenceSource::Handedness => handedness(),
        ConfidenceSource::MeanDepth => depth(),
        ConfidenceSource::HandednessThenDepth => handedness().or_else(depth),
    };
    raw.filter(|v| v.is_finite()).map(|v| v.clamp(0.0, 100.0))
}

pub fn measure_finger_width(
    detection: &HandDetection,
    calibration: Option<&CalibrationResult>,
    frame_side: u32,
    config: &MeasurementConfig,
) -> Result<Measurement> {
    let calibration = calibration.ok_or(Error::CalibrationUnavailable)?;
    let mm_per_pixel = calibration.mm_per_pixel();
    let width_px = finger_width_px(&detection.landmarks, frame_side, config.width_mode)?;
    let length_px = ring_finger_length_px(&detection.landmarks, frame_side);
    let measurement = Measurement {
        finger_width_mm: width_px * mm_per_pixel,
        confidence_percent: confidence_percent(detection, config.confidence_source),
        ring_finger_length_mm: length_px * mm_per_pixel,
        width_mode: config.width_mode,
        method: calibration.method(),
        mm_per_pixel,
    };
    debug!(
        "finger width {:.2} px -> {:.2} mm ({:?}, {:?})",
        width_px,
        measurement.finger_width_mm,
        config.width_mode,
        calibration.method()
    );
    Ok(measurement)
}
