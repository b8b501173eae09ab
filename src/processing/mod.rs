//! Measurement processing: calibration, range validation, stream framing

pub mod calibration;
pub mod framing;

pub use calibration::{in_range, CalibrationModel};
pub use framing::{Frame, FrameRing, FRAME_DELIMITER, FRAME_SIZE};
