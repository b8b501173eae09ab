//! UWB anchor-range localization
//!
//! Converts per-cycle anchor distance readings into 3D position fixes using
//! closed-form trilateration and least-squares multilateration, and recovers
//! fixed-format measurement frames from delimiter-framed byte streams.

pub mod algorithms;
pub mod core;
pub mod engine;
pub mod io;
pub mod processing;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use crate::core::types::{AnchorId, AnchorTable, MeasurementCycle, Position, ZSign};
pub use algorithms::multilateration::multilaterate;
pub use algorithms::trilateration::trilaterate;
pub use engine::LocalizationEngine;
pub use io::{MeasurementSource, PositionSink, SourceReader};
pub use processing::calibration::{in_range, CalibrationModel};
pub use processing::framing::{Frame, FrameRing, FRAME_DELIMITER, FRAME_SIZE};
pub use utils::config::AppConfig;
pub use validation::error::{ConfigError, FrameError, SinkError, SolveError, SourceError};
