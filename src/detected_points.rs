//! Hand landmarks as delivered by the landmark detector.
//!
//! The detector itself is an external collaborator. This module only holds the
//! data contract it answers with (the MediaPipe hand-landmarker result layout)
//! and the [`LandmarkSource`] seam through which detections enter the crate.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const NUM_HAND_LANDMARKS: usize = 21;

/// Anatomical position of a hand landmark.
///
/// The discriminant is the detector's landmark index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl HandLandmark {
    pub const ALL: [HandLandmark; NUM_HAND_LANDMARKS] = [
        HandLandmark::Wrist,
        HandLandmark::ThumbCmc,
        HandLandmark::ThumbMcp,
        HandLandmark::ThumbIp,
        HandLandmark::ThumbTip,
        HandLandmark::IndexMcp,
        HandLandmark::IndexPip,
        HandLandmark::IndexDip,
        HandLandmark::IndexTip,
        HandLandmark::MiddleMcp,
        HandLandmark::MiddlePip,
        HandLandmark::MiddleDip,
        HandLandmark::MiddleTip,
        HandLandmark::RingMcp,
        HandLandmark::RingPip,
        HandLandmark::RingDip,
        HandLandmark::RingTip,
        HandLandmark::PinkyMcp,
        HandLandmark::PinkyPip,
        HandLandmark::PinkyDip,
        HandLandmark::PinkyTip,
    ];

    /// Ring finger joints, base to tip.
    pub const RING_FINGER: [HandLandmark; 4] = [
        HandLandmark::RingMcp,
        HandLandmark::RingPip,
        HandLandmark::RingDip,
        HandLandmark::RingTip,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<HandLandmark> {
        Self::ALL.get(index).copied()
    }
}

/// A single landmark, x/y normalized to the capture frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Landmark {
        Landmark { x, y, z }
    }
}

/// The 21 landmarks of one hand in detector order.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: [Landmark; NUM_HAND_LANDMARKS],
}

impl HandLandmarks {
    pub fn from_slice(points: &[Landmark]) -> Result<HandLandmarks> {
        let points: [Landmark; NUM_HAND_LANDMARKS] =
            points.try_into().map_err(|_| Error::InvalidLandmarkCount {
                expected: NUM_HAND_LANDMARKS,
                got: points.len(),
            })?;
        Ok(HandLandmarks { points })
    }

    pub fn get(&self, which: HandLandmark) -> Landmark {
        self.points[which.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (HandLandmark, &Landmark)> {
        HandLandmark::ALL.iter().copied().zip(self.points.iter())
    }

    pub fn as_slice(&self) -> &[Landmark] {
        &self.points
    }

    pub fn mean_depth(&self) -> f64 {
        self.points.iter().map(|p| p.z).sum::<f64>() / NUM_HAND_LANDMARKS as f64
    }
}

/// One detected hand with the quality signals the detector reports for it.
#[derive(Debug, Clone)]
pub struct HandDetection {
    pub landmarks: HandLandmarks,
    pub world_landmarks: Option<HandLandmarks>,
    pub handedness_score: Option<f64>,
}

impl HandDetection {
    pub fn new(landmarks: HandLandmarks) -> HandDetection {
        HandDetection {
            landmarks,
            world_landmarks: None,
            handedness_score: None,
        }
    }

    pub fn with_handedness_score(mut self, score: f64) -> HandDetection {
        self.handedness_score = Some(score);
        self
    }

    pub fn with_world_landmarks(mut self, world: HandLandmarks) -> HandDetection {
        self.world_landmarks = Some(world);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandednessCategory {
    pub score: f64,
    #[serde(default)]
    pub category_name: Option<String>,
}

/// Raw detector answer for one image.
///
/// An empty `landmarks` list means no hand was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    #[serde(default)]
    pub landmarks: Vec<Vec<Landmark>>,
    #[serde(default)]
    pub world_landmarks: Vec<Vec<Landmark>>,
    #[serde(default)]
    pub handedness: Vec<Vec<HandednessCategory>>,
}

impl DetectionResult {
    /// Validates every detected hand. Malformed hands are an error, not skipped.
    pub fn hands(&self) -> Result<Vec<HandDetection>> {
        self.landmarks
            .iter()
            .enumerate()
            .map(|(i, pts)| {
                let world_landmarks = match self.world_landmarks.get(i) {
                    Some(w) => Some(HandLandmarks::from_slice(w)?),
                    None => None,
                };
                let handedness_score = self
                    .handedness
                    .get(i)
                    .and_then(|categories| categories.first())
                    .map(|c| c.score);
                Ok(HandDetection {
                    landmarks: HandLandmarks::from_slice(pts)?,
                    world_landmarks,
                    handedness_score,
                })
            })
            .collect()
    }

    pub fn first_hand(&self) -> Result<HandDetection> {
        self.hands()?
            .into_iter()
            .next()
            .ok_or(Error::NoHandDetected)
    }
}

/// Supplier of hand detections for a captured image.
pub trait LandmarkSource {
    fn detect(&self, image: &DynamicImage) -> Result<DetectionResult>;
}

impl LandmarkSource for DetectionResult {
    fn detect(&self, _image: &DynamicImage) -> Result<DetectionResult> {
        Ok(self.clone())
    }
}

/// Reads a detection result that was exported next to the capture.
pub struct JsonLandmarkSource {
    path: PathBuf,
}

impl JsonLandmarkSource {
    pub fn new<P: AsRef<Path>>(path: P) -> JsonLandmarkSource {
        JsonLandmarkSource {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Sidecar convention: `capture.jpg` -> `capture.landmarks.json`.
    pub fn sidecar_for(image_path: &Path) -> JsonLandmarkSource {
        let stem = image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        JsonLandmarkSource::new(image_path.with_file_name(format!("{stem}.landmarks.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LandmarkSource for JsonLandmarkSource {
    fn detect(&self, _image: &DynamicImage) -> Result<DetectionResult> {
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
