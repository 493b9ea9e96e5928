pub mod calibration;
pub mod config;
pub mod data_loader;
pub mod detected_points;
pub mod error;
pub mod geometry;
pub mod io;
pub mod measurement;
pub mod perspective;
pub mod quad;
pub mod recommendation;
pub mod session;
pub mod types;
pub mod visualization;

pub use error::{Error, Result};
