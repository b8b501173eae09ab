//! Console sink and multi-sink fan-out

use crate::core::types::Position;
use crate::io::{PositionRecord, PositionSink};
use crate::validation::error::SinkError;
use serde::Deserialize;
use tracing::error;

/// Rendering used by the console sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[default]
    Human,
}

/// Prints each fix to stdout, for debugging and simple piping.
pub struct ConsoleSink {
    format: OutputFormat,
}

impl ConsoleSink {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl PositionSink for ConsoleSink {
    fn send_position(
        &mut self,
        position: &Position,
        timestamp_ms: Option<u64>,
    ) -> Result<(), SinkError> {
        match self.format {
            OutputFormat::Json => {
                let line = serde_json::to_string(&PositionRecord {
                    position,
                    timestamp_ms,
                })?;
                println!("{line}");
            }
            OutputFormat::Human => {
                println!(
                    "Position: x={:.3}, y={:.3}, z={:.3}",
                    position.x, position.y, position.z
                );
            }
        }
        Ok(())
    }
}

/// Fans each fix out to several sinks. A failing member is reported and
/// skipped so the remaining sinks still receive the fix; the fan-out itself
/// therefore never fails.
pub struct MultiSink {
    sinks: Vec<Box<dyn PositionSink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Box<dyn PositionSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl PositionSink for MultiSink {
    fn send_position(
        &mut self,
        position: &Position,
        timestamp_ms: Option<u64>,
    ) -> Result<(), SinkError> {
        for (index, sink) in self.sinks.iter_mut().enumerate() {
            if let Err(err) = sink.send_position(position, timestamp_ms) {
                error!(sink = index, "position delivery failed: {err}");
            }
        }
        Ok(())
    }
}
