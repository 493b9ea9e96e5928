use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::calibration::CalibrationMethod;
use crate::error::Result;
use crate::recommendation::Recommendation;
use crate::session::CaptureOutcome;

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize, P: AsRef<Path>>(output_path: P, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    std::fs::write(output_path, j)?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned, P: AsRef<Path>>(file_path: P) -> Result<T> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    pub capture: String,
    pub method: Option<CalibrationMethod>,
    pub mm_per_pixel: Option<f64>,
    pub finger_width_mm: Option<f64>,
    pub finger_width_cm: Option<f64>,
    pub circumference_mm: Option<f64>,
    pub ring_finger_length_mm: Option<f64>,
    pub confidence_percent: Option<f64>,
    pub recommendation: Option<Recommendation>,
    pub error: Option<String>,
}

impl CaptureReport {
    pub fn from_outcome(capture: &str, outcome: &Result<CaptureOutcome>) -> Self {
        match outcome {
            Ok(o) => {
                let m = &o.measurement;
                CaptureReport {
                    capture: capture.to_string(),
                    method: Some(o.calibration.method()),
                    mm_per_pixel: Some(o.calibration.mm_per_pixel()),
                    finger_width_mm: Some(m.finger_width_mm()),
                    finger_width_cm: Some(m.finger_width_cm()),
                    circumference_mm: Some(m.circumference_mm()),
                    ring_finger_length_mm: Some(m.ring_finger_length_mm()),
                    confidence_percent: m.confidence_percent(),
                    recommendation: None,
                    error: None,
                }
            }
            Err(e) => CaptureReport {
                capture: capture.to_string(),
                method: None,
                mm_per_pixel: None,
                finger_width_mm: None,
                finger_width_cm: None,
                circumference_mm: None,
                ring_finger_length_mm: None,
                confidence_percent: None,
                recommendation: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct MeasurementReport<'a> {
    timestamp: u64,
    measured: usize,
    failed: usize,
    mean_finger_width_mm: Option<f64>,
    median_finger_width_mm: Option<f64>,
    captures: &'a [CaptureReport],
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Writes per-capture results and width statistics as JSON.
pub fn write_measurement_report<P: AsRef<Path>>(
    output_path: P,
    captures: &[CaptureReport],
) -> Result<()> {
    use std::time::SystemTime;

    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut widths: Vec<f64> = captures.iter().filter_map(|c| c.finger_width_mm).collect();
    let mean = if widths.is_empty() {
        None
    } else {
        Some(widths.iter().sum::<f64>() / widths.len() as f64)
    };

    let report = MeasurementReport {
        timestamp,
        measured: widths.len(),
        failed: captures.len() - widths.len(),
        mean_finger_width_mm: mean,
        median_finger_width_mm: median(&mut widths),
        captures,
    };
    object_to_json(output_path, &report)
}
