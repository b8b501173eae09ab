//! TOML configuration surface
//!
//! All inputs to engine construction are immutable configuration: the anchor
//! table, the calibration variant and its parameters, the z-sign policy and
//! the inclusive range bounds, plus one input transport and one or more
//! output sinks.
//!
//! ```toml
//! [localization]
//! calibration_type = "linear"
//! calibration_params = [1.02, -0.05]
//! z_sign = 0
//! min_range = 0.0
//! max_range = 100.0
//!
//! [localization.anchor_positions]
//! 1 = [0.0, 0.0, 0.0]
//! 2 = [3.0, 0.0, 0.0]
//! 3 = [0.0, 3.0, 0.0]
//!
//! [input]
//! type = "serial"
//! port = "/dev/ttyUSB0"
//!
//! [output]
//! type = "console"
//! format = "human"
//! ```

use crate::core::types::{AnchorId, AnchorTable, ZSign};
use crate::engine::LocalizationEngine;
use crate::io::console::OutputFormat;
use crate::processing::calibration::CalibrationModel;
use crate::validation::error::ConfigError;
use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

fn default_baud() -> u32 {
    460_800
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_udp_in_port() -> u16 {
    5005
}

fn default_udp_out_port() -> u16 {
    5006
}

fn default_poll_interval() -> f64 {
    1.0
}

fn default_append() -> bool {
    true
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub localization: LocalizationConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// The engine's configuration surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalizationConfig {
    /// Anchor id -> (x, y, z); TOML table keys are strings, so ids are
    /// written in decimal string form.
    pub anchor_positions: HashMap<String, [f64; 3]>,
    pub calibration_type: String,
    pub calibration_params: Vec<f64>,
    /// 0 = auto, +1 = upper, -1 = lower.
    pub z_sign: i64,
    pub min_range: f64,
    pub max_range: f64,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            anchor_positions: HashMap::from([
                ("1".to_string(), [0.0, 0.0, 0.0]),
                ("2".to_string(), [3.0, 0.0, 0.0]),
                ("3".to_string(), [0.0, 3.0, 0.0]),
            ]),
            calibration_type: "none".to_string(),
            calibration_params: Vec::new(),
            z_sign: 0,
            min_range: 0.0,
            max_range: 100.0,
        }
    }
}

/// Input transport selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputConfig {
    Serial {
        port: String,
        /// Informational; the line is expected to be configured on the
        /// device (e.g. via stty) before startup.
        #[serde(default = "default_baud")]
        baud: u32,
    },
    Udp {
        #[serde(default = "default_bind_host")]
        host: String,
        #[serde(default = "default_udp_in_port")]
        port: u16,
    },
    File {
        filepath: PathBuf,
        /// Seconds between polls of the measurement file.
        #[serde(default = "default_poll_interval")]
        poll_interval: f64,
    },
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig::Serial {
            port: "/dev/ttyUSB0".to_string(),
            baud: default_baud(),
        }
    }
}

/// Output sink selection. `multi` fans out to a list of nested sinks.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    Console {
        #[serde(default)]
        format: OutputFormat,
    },
    Udp {
        host: String,
        #[serde(default = "default_udp_out_port")]
        port: u16,
    },
    File {
        filepath: PathBuf,
        #[serde(default = "default_append")]
        append: bool,
    },
    Multi {
        sinks: Vec<OutputConfig>,
    },
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig::Console {
            format: OutputFormat::Human,
        }
    }
}

impl AppConfig {
    /// Read and parse a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Parse the anchor table out of its string-keyed TOML form.
    pub fn anchor_table(&self) -> Result<AnchorTable, ConfigError> {
        let mut table = AnchorTable::new();
        for (key, position) in &self.localization.anchor_positions {
            let id: AnchorId = key.parse().map_err(|_| ConfigError::AnchorId {
                key: key.clone(),
            })?;
            table.insert(id, Vector3::new(position[0], position[1], position[2]));
        }
        Ok(table)
    }

    /// Build the localization engine this configuration describes.
    /// Any failure here is fatal at startup.
    pub fn build_engine(&self) -> Result<LocalizationEngine, ConfigError> {
        let anchors = self.anchor_table()?;
        let calibration = CalibrationModel::from_config(
            &self.localization.calibration_type,
            &self.localization.calibration_params,
        )?;
        let z_sign = ZSign::try_from(self.localization.z_sign)?;
        LocalizationEngine::new(
            anchors,
            calibration,
            z_sign,
            self.localization.min_range,
            self.localization.max_range,
        )
    }
}
