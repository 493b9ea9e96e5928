//! One capture, start to finish.
//!
//! Every call works on its own inputs only, so a retake is just another call
//! and a discarded result leaves nothing behind.

use log::{info, warn};

use crate::calibration::{Calibrate, CalibrationInput, CalibrationResult, CalibrationStrategy};
use crate::detected_points::DetectionResult;
use crate::error::Result;
use crate::measurement::{Measurement, MeasurementConfig, measure_finger_width};
use crate::recommendation::{Recommendation, RecommendationRequest, SizeRecommender};
use crate::types::CaptureFrame;

#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub calibration: CalibrationResult,
    pub measurement: Measurement,
}

/// Calibrates and measures the first detected hand.
///
/// Fails with `NoHandDetected` for an empty detection and with the strategy's
/// own error when calibration fails.
pub fn measure_capture(
    detections: &DetectionResult,
    frame: &CaptureFrame,
    strategy: &CalibrationStrategy,
    config: &MeasurementConfig,
) -> Result<CaptureOutcome> {
    let hand = detections.first_hand()?;
    let calibration = strategy.calibrate(&CalibrationInput {
        frame,
        hand: Some(&hand),
    })?;
    let measurement = measure_finger_width(&hand, Some(&calibration), frame.side(), config)?;
    info!(
        "finger width {:.2} mm via {:?} ({:.4} mm/px)",
        measurement.finger_width_mm(),
        calibration.method(),
        calibration.mm_per_pixel()
    );
    Ok(CaptureOutcome {
        calibration,
        measurement,
    })
}

/// Asks the recommender for a size. The measurement stays valid whatever the
/// recommender answers.
pub fn recommend<R: SizeRecommender + ?Sized>(
    recommender: &R,
    measurement: &Measurement,
    reference_image_base64: &str,
) -> Result<Recommendation> {
    let request = RecommendationRequest::new(measurement, reference_image_base64);
    recommender.recommend(&request).inspect_err(|e| {
        warn!("size recommendation failed: {}", e);
    })
}
