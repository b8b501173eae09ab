//! Configuration loading

pub mod config;

pub use config::{AppConfig, InputConfig, LocalizationConfig, OutputConfig};
