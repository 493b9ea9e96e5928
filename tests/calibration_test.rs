use glam::DVec2;
use ring_gauge::Error;
use ring_gauge::calibration::{
    Calibrate, CalibrationInput, CalibrationMethod, CalibrationResult, CalibrationStrategy,
    CardReference, FixedFrame, HeightHeuristic,
};
use ring_gauge::config::{SessionConfig, StrategyKind};
use ring_gauge::detected_points::{HandDetection, HandLandmark, HandLandmarks, Landmark};
use ring_gauge::quad::Quad;
use ring_gauge::types::CaptureFrame;

fn hand_with(points: &[(HandLandmark, f64, f64)]) -> HandDetection {
    let mut pts = vec![Landmark::new(0.5, 0.5, 0.0); 21];
    for &(which, x, y) in points {
        pts[which.index()] = Landmark::new(x, y, 0.0);
    }
    HandDetection::new(HandLandmarks::from_slice(&pts).unwrap())
}

#[test]
fn test_fixed_frame_scale() {
    let frame = CaptureFrame::landmarks_only(300);
    let result = FixedFrame::default()
        .calibrate(&CalibrationInput { frame: &frame, hand: None })
        .unwrap();
    assert_eq!(result.method(), CalibrationMethod::FixedFrame);
    assert!((result.mm_per_pixel() - 200.0 / 300.0).abs() < 1e-12);
    assert!(result.reference_quad().is_none());
}

#[test]
fn test_card_scale_uses_card_width_over_rectified_width() {
    let quad = Quad::from_corners([
        DVec2::new(10.0, 10.0),
        DVec2::new(110.0, 10.0),
        DVec2::new(110.0, 73.0),
        DVec2::new(10.0, 73.0),
    ]);
    let result = CardReference::default().scale_from_quad(&quad).unwrap();
    assert_eq!(result.mm_per_pixel(), 85.6 / 100.0);
    assert_eq!(result.method(), CalibrationMethod::CardReference);
    assert_eq!(result.reference_quad(), Some(&quad));
}

#[test]
fn test_card_scale_takes_longer_horizontal_edge() {
    // perspective: bottom edge is wider than the top edge
    let quad = Quad::from_corners([
        DVec2::new(20.0, 10.0),
        DVec2::new(100.0, 10.0),
        DVec2::new(110.0, 70.0),
        DVec2::new(10.0, 70.0),
    ]);
    let result = CardReference::default().scale_from_quad(&quad).unwrap();
    assert!((result.mm_per_pixel() - 85.6 / 100.0).abs() < 1e-12);
}

#[test]
fn test_card_strategy_needs_image() {
    let frame = CaptureFrame::landmarks_only(300);
    let err = CardReference::default()
        .calibrate(&CalibrationInput { frame: &frame, hand: None })
        .unwrap_err();
    assert!(matches!(err, Error::FrameImageUnavailable));
}

#[test]
fn test_height_heuristic_scale() {
    let strategy = HeightHeuristic {
        height_mm: Some(1700.0),
        hand_length_fraction: 0.105,
    };
    let result = strategy.scale_from_hand_length(120.0).unwrap();
    assert!((result.mm_per_pixel() - 1700.0 * 0.105 / 120.0).abs() < 1e-12);

    // wrist to middle fingertip spans 0.4 of a 300 px frame = 120 px
    let hand = hand_with(&[
        (HandLandmark::Wrist, 0.5, 0.8),
        (HandLandmark::MiddleTip, 0.5, 0.4),
    ]);
    let frame = CaptureFrame::landmarks_only(300);
    let result = strategy
        .calibrate(&CalibrationInput { frame: &frame, hand: Some(&hand) })
        .unwrap();
    assert!((result.mm_per_pixel() - 1700.0 * 0.105 / 120.0).abs() < 1e-9);
    assert_eq!(result.method(), CalibrationMethod::HeightHeuristic);
}

#[test]
fn test_height_heuristic_without_height() {
    let hand = hand_with(&[(HandLandmark::Wrist, 0.5, 0.8)]);
    let frame = CaptureFrame::landmarks_only(300);
    for height_mm in [None, Some(0.0), Some(-170.0), Some(f64::NAN)] {
        let err = HeightHeuristic::new(height_mm)
            .calibrate(&CalibrationInput { frame: &frame, hand: Some(&hand) })
            .unwrap_err();
        assert!(matches!(err, Error::MissingHeight), "{:?}", height_mm);
    }
}

#[test]
fn test_missing_height_is_reported_before_missing_hand() {
    let frame = CaptureFrame::landmarks_only(300);
    let err = HeightHeuristic::new(None)
        .calibrate(&CalibrationInput { frame: &frame, hand: None })
        .unwrap_err();
    assert!(matches!(err, Error::MissingHeight));
}

#[test]
fn test_height_heuristic_without_hand() {
    let frame = CaptureFrame::landmarks_only(300);
    let err = HeightHeuristic::new(Some(1700.0))
        .calibrate(&CalibrationInput { frame: &frame, hand: None })
        .unwrap_err();
    assert!(matches!(err, Error::NoHandDetected));
}

#[test]
fn test_height_heuristic_degenerate_hand() {
    let frame = CaptureFrame::landmarks_only(300);
    let hand = hand_with(&[]);
    let err = HeightHeuristic::new(Some(1700.0))
        .calibrate(&CalibrationInput { frame: &frame, hand: Some(&hand) })
        .unwrap_err();
    assert!(matches!(err, Error::DegenerateLine));
}

#[test]
fn test_invalid_scales_are_rejected() {
    for scale in [0.0, -1.0, f64::INFINITY, f64::NAN] {
        let err = CalibrationResult::new(scale, CalibrationMethod::FixedFrame, None).unwrap_err();
        assert!(matches!(err, Error::InvalidScale(_)));
    }
}

#[test]
fn test_strategy_from_config() {
    let config = SessionConfig {
        strategy: StrategyKind::HeightHeuristic,
        hand_length_fraction: 0.1,
        ..Default::default()
    };
    match config.strategy(Some(1800.0)) {
        CalibrationStrategy::HeightHeuristic(h) => {
            assert_eq!(h.height_mm, Some(1800.0));
            assert_eq!(h.hand_length_fraction, 0.1);
        }
        other => panic!("unexpected strategy {:?}", other),
    }
    let fixed = SessionConfig::default().strategy(None);
    assert_eq!(fixed.method(), CalibrationMethod::FixedFrame);
}
