use serde::{Deserialize, Serialize};

use crate::calibration::{
    CalibrationStrategy, CardReference, DEFAULT_CARD_WIDTH_MM, DEFAULT_FRAME_WIDTH_MM,
    DEFAULT_HAND_LENGTH_FRACTION, FixedFrame, HeightHeuristic,
};
use crate::measurement::MeasurementConfig;
use crate::quad::{CardDetector, CardDetectorConfig};

pub const DEFAULT_CAPTURE_SIZE: u32 = 300;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    FixedFrame,
    CardReference,
    HeightHeuristic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Side `S` of the square capture, used when no image is attached.
    pub capture_size: u32,
    pub fixed_frame_width_mm: f64,
    pub card_width_mm: f64,
    pub hand_length_fraction: f64,
    pub strategy: StrategyKind,
    pub detector: CardDetectorConfig,
    pub measurement: MeasurementConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capture_size: DEFAULT_CAPTURE_SIZE,
            fixed_frame_width_mm: DEFAULT_FRAME_WIDTH_MM,
            card_width_mm: DEFAULT_CARD_WIDTH_MM,
            hand_length_fraction: DEFAULT_HAND_LENGTH_FRACTION,
            strategy: StrategyKind::default(),
            detector: CardDetectorConfig::default(),
            measurement: MeasurementConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Builds the configured strategy. The body height only matters for
    /// [`StrategyKind::HeightHeuristic`].
    pub fn strategy(&self, height_mm: Option<f64>) -> CalibrationStrategy {
        match self.strategy {
            StrategyKind::FixedFrame => CalibrationStrategy::FixedFrame(FixedFrame {
                frame_width_mm: self.fixed_frame_width_mm,
            }),
            StrategyKind::CardReference => CalibrationStrategy::CardReference(CardReference {
                card_width_mm: self.card_width_mm,
                detector: CardDetector::new(self.detector.clone()),
            }),
            StrategyKind::HeightHeuristic => {
                CalibrationStrategy::HeightHeuristic(HeightHeuristic {
                    height_mm,
                    hand_length_fraction: self.hand_length_fraction,
                })
            }
        }
    }
}
