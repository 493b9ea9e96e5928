//! Millimeter-per-pixel calibration.
//!
//! Three strategies share the [`Calibrate`] contract and are selected
//! explicitly through [`CalibrationStrategy`]. A failing strategy reports its
//! error; nothing here falls back to another strategy.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::detected_points::{HandDetection, HandLandmark};
use crate::error::{Error, Result};
use crate::geometry::{distance, landmark_to_pixel};
use crate::quad::{CardDetector, Quad, RectifiedCard};
use crate::types::CaptureFrame;

pub const DEFAULT_CARD_WIDTH_MM: f64 = 85.6;
pub const DEFAULT_FRAME_WIDTH_MM: f64 = 200.0;
/// Hand length (wrist crease to middle fingertip) over stature.
pub const DEFAULT_HAND_LENGTH_FRACTION: f64 = 0.108;

const MIN_HAND_LENGTH_PX: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationMethod {
    FixedFrame,
    CardReference,
    HeightHeuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationResult {
    mm_per_pixel: f64,
    method: CalibrationMethod,
    reference_quad: Option<Quad>,
}

impl CalibrationResult {
    pub fn new(
        mm_per_pixel: f64,
        method: CalibrationMethod,
        reference_quad: Option<Quad>,
    ) -> Result<CalibrationResult> {
        if !mm_per_pixel.is_finite() || mm_per_pixel <= 0.0 {
            return Err(Error::InvalidScale(mm_per_pixel));
        }
        Ok(CalibrationResult {
            mm_per_pixel,
            method,
            reference_quad,
        })
    }

    pub fn mm_per_pixel(&self) -> f64 {
        self.mm_per_pixel
    }

    pub fn method(&self) -> CalibrationMethod {
        self.method
    }

    pub fn reference_quad(&self) -> Option<&Quad> {
        self.reference_quad.as_ref()
    }
}

pub struct CalibrationInput<'a> {
    pub frame: &'a CaptureFrame,
    pub hand: Option<&'a HandDetection>,
}

pub trait Calibrate {
    fn method(&self) -> CalibrationMethod;
    fn calibrate(&self, input: &CalibrationInput) -> Result<CalibrationResult>;
}

/// The capture frame is assumed to span a known physical width.
///
/// Does not compensate for hand-to-camera distance.
#[derive(Debug, Clone)]
pub struct FixedFrame {
    pub frame_width_mm: f64,
}

impl Default for FixedFrame {
    fn default() -> Self {
        Self {
            frame_width_mm: DEFAULT_FRAME_WIDTH_MM,
        }
    }
}

impl Calibrate for FixedFrame {
    fn method(&self) -> CalibrationMethod {
        CalibrationMethod::FixedFrame
    }

    fn calibrate(&self, input: &CalibrationInput) -> Result<CalibrationResult> {
        let side = input.frame.side() as f64;
        CalibrationResult::new(self.frame_width_mm / side, self.method(), None)
    }
}

/// Scale from a reference card found in the capture.
#[derive(Debug, Clone)]
pub struct CardReference {
    pub card_width_mm: f64,
    pub detector: CardDetector,
}

impl Default for CardReference {
    fn default() -> Self {
        Self {
            card_width_mm: DEFAULT_CARD_WIDTH_MM,
            detector: CardDetector::default(),
        }
    }
}

impl CardReference {
    /// `card_width_mm / max(top edge, bottom edge)` of an already found quad.
    pub fn scale_from_quad(&self, quad: &Quad) -> Result<CalibrationResult> {
        let (width_px, _) = quad.rectified_size();
        CalibrationResult::new(
            self.card_width_mm / width_px,
            CalibrationMethod::CardReference,
            Some(*quad),
        )
    }

    pub fn calibrate_with_card(
        &self,
        frame: &CaptureFrame,
    ) -> Result<(CalibrationResult, RectifiedCard)> {
        let image = frame.image().ok_or(Error::FrameImageUnavailable)?;
        let card = self.detector.detect(image)?;
        let result = self.scale_from_quad(&card.quad)?;
        info!(
            "card reference: {:.2} px wide, {:.4} mm/px",
            card.width_px,
            result.mm_per_pixel()
        );
        Ok((result, card))
    }
}

impl Calibrate for CardReference {
    fn method(&self) -> CalibrationMethod {
        CalibrationMethod::CardReference
    }

    fn calibrate(&self, input: &CalibrationInput) -> Result<CalibrationResult> {
        self.calibrate_with_card(input.frame).map(|(result, _)| result)
    }
}

/// Scale from body height, assuming hand length is a fixed fraction of it.
#[derive(Debug, Clone)]
pub struct HeightHeuristic {
    pub height_mm: Option<f64>,
    pub hand_length_fraction: f64,
}

impl HeightHeuristic {
    pub fn new(height_mm: Option<f64>) -> HeightHeuristic {
        HeightHeuristic {
            height_mm,
            hand_length_fraction: DEFAULT_HAND_LENGTH_FRACTION,
        }
    }

    fn valid_height(&self) -> Result<f64> {
        self.height_mm
            .filter(|h| h.is_finite() && *h > 0.0)
            .ok_or(Error::MissingHeight)
    }

    pub fn scale_from_hand_length(&self, hand_length_px: f64) -> Result<CalibrationResult> {
        let height_mm = self.valid_height()?;
        if hand_length_px < MIN_HAND_LENGTH_PX {
            return Err(Error::DegenerateLine);
        }
        let hand_length_mm = height_mm * self.hand_length_fraction;
        debug!(
            "height {:.0} mm -> hand {:.1} mm over {:.2} px",
            height_mm, hand_length_mm, hand_length_px
        );
        CalibrationResult::new(
            hand_length_mm / hand_length_px,
            CalibrationMethod::HeightHeuristic,
            None,
        )
    }
}

impl Calibrate for HeightHeuristic {
    fn method(&self) -> CalibrationMethod {
        CalibrationMethod::HeightHeuristic
    }

    fn calibrate(&self, input: &CalibrationInput) -> Result<CalibrationResult> {
        // a missing height is reported before a missing hand
        self.valid_height()?;
        let hand = input.hand.ok_or(Error::NoHandDetected)?;
        let side = input.frame.side();
        let wrist = landmark_to_pixel(&hand.landmarks.get(HandLandmark::Wrist), side);
        let middle_tip = landmark_to_pixel(&hand.landmarks.get(HandLandmark::MiddleTip), side);
        self.scale_from_hand_length(distance(wrist, middle_tip))
    }
}

/// Calibration chosen for a capture session.
#[derive(Debug, Clone)]
pub enum CalibrationStrategy {
    FixedFrame(FixedFrame),
    CardReference(CardReference),
    HeightHeuristic(HeightHeuristic),
}

impl Calibrate for CalibrationStrategy {
    fn method(&self) -> CalibrationMethod {
        match self {
            CalibrationStrategy::FixedFrame(s) => s.method(),
            CalibrationStrategy::CardReference(s) => s.method(),
            CalibrationStrategy::HeightHeuristic(s) => s.method(),
        }
    }

    fn calibrate(&self, input: &CalibrationInput) -> Result<CalibrationResult> {
        match self {
            CalibrationStrategy::FixedFrame(s) => s.calibrate(input),
            CalibrationStrategy::CardReference(s) => s.calibrate(input),
            CalibrationStrategy::HeightHeuristic(s) => s.calibrate(input),
        }
    }
}
