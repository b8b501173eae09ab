//! Core data types for the localization system

pub mod types;

pub use types::{AnchorId, AnchorTable, MeasurementCycle, Position, ZSign};
