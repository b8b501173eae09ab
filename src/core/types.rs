//! Core data types shared across the localization pipeline

use crate::validation::error::ConfigError;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a fixed ranging anchor.
///
/// Matches the u8 id carried by the wire frame. Ids need not be contiguous
/// or zero-based.
pub type AnchorId = u8;

/// Known anchor positions, keyed by anchor id.
///
/// Supplied at engine construction and immutable for the engine's lifetime;
/// reconfiguration means constructing a new engine.
pub type AnchorTable = HashMap<AnchorId, Vector3<f64>>;

/// One batch of anchor -> distance readings (meters) processed together to
/// produce at most one position fix. An anchor with no reading this cycle is
/// simply absent from the map, never a sentinel value.
pub type MeasurementCycle = HashMap<AnchorId, f64>;

/// 3D position estimate in the same coordinate frame as the configured
/// anchor positions. A single point, no orientation or uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Which of the two geometric solutions for the vertical coordinate to
/// report when the anchor geometry leaves the sign ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZSign {
    /// Leave the solved z as-is (least-squares path) or take the upper
    /// solution (closed-form path).
    #[default]
    Auto,
    /// Force z >= 0.
    Upper,
    /// Force z <= 0.
    Lower,
}

impl TryFrom<i64> for ZSign {
    type Error = ConfigError;

    /// Converts the configuration encoding: 0 = auto, +1 = upper, -1 = lower.
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ZSign::Auto),
            1 => Ok(ZSign::Upper),
            -1 => Ok(ZSign::Lower),
            _ => Err(ConfigError::ZSign { value }),
        }
    }
}
