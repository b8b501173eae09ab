//! Error taxonomy for the localization system

pub mod error;

pub use error::{ConfigError, FrameError, SinkError, SolveError, SourceError};
