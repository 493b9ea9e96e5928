use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no hand detected in the capture")]
    NoHandDetected,

    #[error("no card-shaped reference quadrilateral found in the capture")]
    ReferenceNotFound,

    #[error("body height is missing or not positive")]
    MissingHeight,

    #[error("degenerate line: the defining points coincide")]
    DegenerateLine,

    #[error("no valid calibration available for this capture")]
    CalibrationUnavailable,

    #[error("recommendation service error: {0}")]
    RecommendationService(String),

    #[error("expected {expected} hand landmarks, got {got}")]
    InvalidLandmarkCount { expected: usize, got: usize },

    #[error("invalid scale {0} mm/px: must be positive and finite")]
    InvalidScale(f64),

    #[error("capture frame must be square, got {width}x{height}")]
    NonSquareFrame { width: u32, height: u32 },

    #[error("the card strategy needs the captured image, but the frame has none")]
    FrameImageUnavailable,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
