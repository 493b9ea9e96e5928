use std::path::{Path, PathBuf};

use glob::glob;
use image::ImageReader;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use rerun::TimeCell;

use crate::calibration::CalibrationStrategy;
use crate::detected_points::{DetectionResult, JsonLandmarkSource, LandmarkSource};
use crate::error::Result;
use crate::io::object_from_json;
use crate::measurement::MeasurementConfig;
use crate::session::{CaptureOutcome, measure_capture};
use crate::types::CaptureFrame;
use crate::visualization::{log_hand, log_image_as_compressed, log_quad};

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        for ext in &[".png", ".jpg", ".jpeg"] {
            if p.as_os_str().to_string_lossy().to_lowercase().ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

/// Capture images directly inside `root_folder`, sorted by path.
pub fn list_captures(root_folder: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*", root_folder.trim_end_matches('/'));
    let img_paths = glob(&pattern).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let mut sorted_path: Vec<PathBuf> = img_paths.into_iter().filter_map(img_filter).collect();
    sorted_path.sort();
    Ok(sorted_path)
}

/// Measures one capture using its `<stem>.landmarks.json` sidecar.
pub fn measure_capture_file(
    path: &Path,
    strategy: &CalibrationStrategy,
    config: &MeasurementConfig,
    recording_option: Option<&rerun::RecordingStream>,
) -> Result<CaptureOutcome> {
    let img = ImageReader::open(path)?.decode()?;
    let detections = JsonLandmarkSource::sidecar_for(path).detect(&img)?;
    let frame = CaptureFrame::from_image(img)?;
    let outcome = measure_capture(&detections, &frame, strategy, config);

    if let Some(recording) = recording_option {
        let topic = "capture";
        let logged = frame
            .image()
            .map(|img| log_image_as_compressed(recording, topic, img, image::ImageFormat::Png))
            .transpose()
            .and_then(|_| match detections.first_hand() {
                Ok(hand) => log_hand(recording, topic, &hand.landmarks, frame.side()),
                Err(_) => Ok(()),
            })
            .and_then(|_| match outcome.as_ref().ok().and_then(|o| o.calibration.reference_quad()) {
                Some(quad) => log_quad(recording, topic, quad),
                None => Ok(()),
            });
        if let Err(e) = logged {
            log::warn!("failed to log {} to rerun: {}", path.display(), e);
        }
    }
    outcome
}

/// Measures a detection exported without its image, on a `frame_side` frame.
///
/// Only strategies that do not look at pixels can succeed here.
pub fn measure_landmarks_file(
    path: &Path,
    frame_side: u32,
    strategy: &CalibrationStrategy,
    config: &MeasurementConfig,
) -> Result<CaptureOutcome> {
    let detections: DetectionResult = object_from_json(path)?;
    let frame = CaptureFrame::landmarks_only(frame_side);
    measure_capture(&detections, &frame, strategy, config)
}

/// Measures every capture in a folder in parallel.
///
/// Captures are independent; a failing capture yields its error in place and
/// does not stop the others. Results are in path order.
pub fn measure_folder(
    root_folder: &str,
    strategy: &CalibrationStrategy,
    config: &MeasurementConfig,
    recording_option: Option<&rerun::RecordingStream>,
) -> Result<Vec<(PathBuf, Result<CaptureOutcome>)>> {
    let paths = list_captures(root_folder)?;
    log::trace!("measuring {} captures in {}", paths.len(), root_folder);
    let results = paths
        .par_iter()
        .enumerate()
        .progress_count(paths.len() as u64)
        .map(|(idx, path)| {
            if let Some(recording) = recording_option {
                recording.set_time("capture", TimeCell::from_sequence(idx as i64));
            }
            let outcome = measure_capture_file(path, strategy, config, recording_option);
            (path.clone(), outcome)
        })
        .collect();
    Ok(results)
}
