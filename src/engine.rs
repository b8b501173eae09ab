//! Localization engine
//!
//! Composes calibration, range validation and the position solver behind a
//! single per-cycle entry point. The engine is immutable after construction,
//! so it can be shared across reader threads without synchronization.

use crate::algorithms::multilateration::multilaterate;
use crate::core::types::{AnchorTable, MeasurementCycle, Position, ZSign};
use crate::processing::calibration::{in_range, CalibrationModel};
use crate::validation::error::ConfigError;
use tracing::{debug, warn};

pub struct LocalizationEngine {
    anchors: AnchorTable,
    calibration: CalibrationModel,
    z_sign: ZSign,
    min_range: f64,
    max_range: f64,
}

impl LocalizationEngine {
    /// Build an engine from its immutable configuration.
    ///
    /// Fails when the anchor table has fewer than three entries or the range
    /// bounds are inverted; both are fatal configuration faults.
    pub fn new(
        anchors: AnchorTable,
        calibration: CalibrationModel,
        z_sign: ZSign,
        min_range: f64,
        max_range: f64,
    ) -> Result<Self, ConfigError> {
        if anchors.len() < 3 {
            return Err(ConfigError::InsufficientAnchors {
                available: anchors.len(),
            });
        }
        if min_range > max_range {
            return Err(ConfigError::RangeBounds {
                min: min_range,
                max: max_range,
            });
        }
        Ok(Self {
            anchors,
            calibration,
            z_sign,
            min_range,
            max_range,
        })
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Apply the configured calibration to a raw distance.
    pub fn calibrate(&self, raw: f64) -> f64 {
        self.calibration.apply(raw)
    }

    /// Whether a calibrated distance falls within the configured bounds,
    /// inclusive at both ends.
    pub fn validate_range(&self, distance: f64) -> bool {
        in_range(self.min_range, self.max_range, distance)
    }

    /// Produce at most one position fix from a measurement cycle.
    ///
    /// Each raw sample is calibrated and kept only if in range. Fewer than
    /// three survivors is a normal outcome under sparse cycles, not an
    /// error. Solver failures are reported and swallowed: a missing fix
    /// must never break the caller's loop.
    pub fn calculate_position(&self, cycle: &MeasurementCycle) -> Option<Position> {
        let valid: MeasurementCycle = cycle
            .iter()
            .map(|(&id, &raw)| (id, self.calibrate(raw)))
            .filter(|&(_, corrected)| self.validate_range(corrected))
            .collect();

        if valid.len() < 3 {
            debug!(
                supplied = cycle.len(),
                surviving = valid.len(),
                "not enough in-range samples for a fix"
            );
            return None;
        }

        match multilaterate(&self.anchors, &valid, self.z_sign) {
            Ok(position) => Some(position),
            Err(err) => {
                warn!("position solve failed: {err}");
                None
            }
        }
    }
}
