use ring_gauge::Error;
use ring_gauge::calibration::{CalibrationMethod, CalibrationResult};
use ring_gauge::detected_points::{HandDetection, HandLandmark, HandLandmarks, Landmark};
use ring_gauge::measurement::{
    ConfidenceSource, MeasurementConfig, WidthMode, confidence_percent, finger_width_px,
    measure_finger_width, ring_finger_length_px,
};

const S: u32 = 300;

fn reference_hand() -> HandDetection {
    let mut pts = vec![Landmark::new(0.5, 0.5, 0.0); 21];
    pts[HandLandmark::RingMcp.index()] = Landmark::new(0.5, 0.5, 0.0);
    pts[HandLandmark::RingPip.index()] = Landmark::new(0.5, 0.6, 0.0);
    pts[HandLandmark::RingDip.index()] = Landmark::new(0.5, 0.65, 0.0);
    pts[HandLandmark::RingTip.index()] = Landmark::new(0.5, 0.7, 0.0);
    pts[HandLandmark::MiddlePip.index()] = Landmark::new(0.45, 0.6, 0.0);
    pts[HandLandmark::IndexPip.index()] = Landmark::new(0.55, 0.6, 0.0);
    HandDetection::new(HandLandmarks::from_slice(&pts).unwrap())
}

fn calibration(mm_per_pixel: f64) -> CalibrationResult {
    CalibrationResult::new(mm_per_pixel, CalibrationMethod::FixedFrame, None).unwrap()
}

#[test]
fn test_axis_perpendicular_width() {
    let hand = reference_hand();
    let width = finger_width_px(&hand.landmarks, S, WidthMode::AxisPerpendicular).unwrap();
    assert!((width - 15.0).abs() < 1e-9);

    let m = measure_finger_width(&hand, Some(&calibration(0.667)), S, &MeasurementConfig::default())
        .unwrap();
    assert!((m.finger_width_mm() - 10.005).abs() < 1e-9);
    assert!((m.finger_width_cm() - 1.0005).abs() < 1e-9);
    assert!((m.circumference_mm() - 10.005 * std::f64::consts::PI).abs() < 1e-9);
    assert_eq!(m.method(), CalibrationMethod::FixedFrame);
    assert_eq!(m.width_mode(), WidthMode::AxisPerpendicular);
}

#[test]
fn test_adjacent_pip_width() {
    let hand = reference_hand();
    // ring-middle: hypot(15, 0) = 15, middle-index: 30
    let width = finger_width_px(&hand.landmarks, S, WidthMode::AdjacentPip).unwrap();
    assert!((width - 22.5).abs() < 1e-9);
}

#[test]
fn test_width_with_coincident_axis_points() {
    let mut pts = vec![Landmark::new(0.5, 0.5, 0.0); 21];
    pts[HandLandmark::MiddlePip.index()] = Landmark::new(0.4, 0.5, 0.0);
    let landmarks = HandLandmarks::from_slice(&pts).unwrap();
    let err = finger_width_px(&landmarks, S, WidthMode::AxisPerpendicular).unwrap_err();
    assert!(matches!(err, Error::DegenerateLine));
}

#[test]
fn test_ring_finger_length() {
    let hand = reference_hand();
    // 0.5 -> 0.6 -> 0.65 -> 0.7 along y on a 300 px frame
    let length = ring_finger_length_px(&hand.landmarks, S);
    assert!((length - 60.0).abs() < 1e-9);
    let m = measure_finger_width(&hand, Some(&calibration(0.5)), S, &MeasurementConfig::default())
        .unwrap();
    assert!((m.ring_finger_length_mm() - 30.0).abs() < 1e-9);
}

#[test]
fn test_measurement_needs_calibration() {
    let err = measure_finger_width(&reference_hand(), None, S, &MeasurementConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::CalibrationUnavailable));
}

#[test]
fn test_confidence_sources() {
    let pts = vec![Landmark::new(0.5, 0.5, 0.4); 21];
    let world = HandLandmarks::from_slice(&vec![Landmark::new(0.0, 0.0, 0.2); 21]).unwrap();
    let plain = HandDetection::new(HandLandmarks::from_slice(&pts).unwrap());

    assert_eq!(confidence_percent(&plain, ConfidenceSource::Handedness), None);
    let depth = confidence_percent(&plain, ConfidenceSource::MeanDepth).unwrap();
    assert!((depth - 40.0).abs() < 1e-9);
    let fallback = confidence_percent(&plain, ConfidenceSource::HandednessThenDepth).unwrap();
    assert!((fallback - 40.0).abs() < 1e-9);

    let scored = plain.clone().with_handedness_score(0.93);
    let h = confidence_percent(&scored, ConfidenceSource::HandednessThenDepth).unwrap();
    assert!((h - 93.0).abs() < 1e-9);

    let with_world = plain.with_world_landmarks(world);
    let w = confidence_percent(&with_world, ConfidenceSource::MeanDepth).unwrap();
    assert!((w - 20.0).abs() < 1e-9);
}

#[test]
fn test_confidence_is_clamped() {
    let pts = vec![Landmark::new(0.5, 0.5, -0.3); 21];
    let hand = HandDetection::new(HandLandmarks::from_slice(&pts).unwrap());
    assert_eq!(confidence_percent(&hand, ConfidenceSource::MeanDepth), Some(0.0));
    let hand = hand.with_handedness_score(1.7);
    assert_eq!(confidence_percent(&hand, ConfidenceSource::Handedness), Some(100.0));
}
