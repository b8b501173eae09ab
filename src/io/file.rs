//! File-based measurement source and position sink
//!
//! The source polls a JSON file of distance readings at a fixed interval,
//! mainly for replay and bench setups. The sink appends one JSON line per
//! fix.

use crate::core::types::{MeasurementCycle, Position};
use crate::io::udp::parse_cycle_payload;
use crate::io::{MeasurementSource, PositionRecord, PositionSink};
use crate::validation::error::{SinkError, SourceError};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::warn;

pub struct FileSource {
    path: PathBuf,
    poll_interval: Duration,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P, poll_interval: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            poll_interval,
        }
    }
}

impl MeasurementSource for FileSource {
    fn poll_cycle(&mut self) -> Result<Option<MeasurementCycle>, SourceError> {
        thread::sleep(self.poll_interval);
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "measurement file not found");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        parse_cycle_payload(&data).map(Some)
    }
}

/// Appends one JSON line per fix, flushed immediately so tail consumers see
/// positions as they are produced.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn create<P: AsRef<Path>>(path: P, append: bool) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl PositionSink for FileSink {
    fn send_position(
        &mut self,
        position: &Position,
        timestamp_ms: Option<u64>,
    ) -> Result<(), SinkError> {
        let line = serde_json::to_string(&PositionRecord {
            position,
            timestamp_ms,
        })?;
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_reads_cycle() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), br#"{"1": 1.5, "2": 2.5, "3": 3.5}"#).unwrap();

        let mut source = FileSource::new(file.path(), Duration::from_millis(1));
        let cycle = source.poll_cycle().unwrap().unwrap();
        assert_eq!(cycle.len(), 3);
        assert_eq!(cycle[&3], 3.5);
    }

    #[test]
    fn test_missing_file_is_not_fatal() {
        let mut source = FileSource::new("/nonexistent/distances.json", Duration::from_millis(1));
        assert!(source.poll_cycle().unwrap().is_none());
    }

    #[test]
    fn test_file_sink_writes_json_lines() {
        let file = NamedTempFile::new().unwrap();
        let mut sink = FileSink::create(file.path(), true).unwrap();
        sink.send_position(&Position::new(1.0, 2.0, 3.0), Some(42))
            .unwrap();
        sink.send_position(&Position::new(4.0, 5.0, 6.0), None)
            .unwrap();

        let contents = fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["position"]["x"], 1.0);
        assert_eq!(first["timestamp_ms"], 42);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert!(second.get("timestamp_ms").is_none());
    }
}
