//! Transport adapters: measurement sources and position sinks
//!
//! Sources and sinks are the thin, replaceable boundary of the system. Each
//! source is driven by its own reader thread which owns the source (and any
//! framing state) exclusively and pushes completed measurement cycles onto a
//! bounded channel; the consumer loop drains that channel, decoupling
//! blocking I/O from computation.

pub mod console;
pub mod file;
pub mod serial;
pub mod udp;

pub use console::{ConsoleSink, MultiSink, OutputFormat};
pub use file::{FileSink, FileSource};
pub use serial::SerialSource;
pub use udp::{UdpSink, UdpSource};

use crate::core::types::{MeasurementCycle, Position};
use crate::validation::error::{SinkError, SourceError};
use serde::Serialize;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Back-off after a transport read failure before polling again.
const READ_RETRY_DELAY: Duration = Duration::from_millis(100);

/// How long `stop` waits for the reader thread before detaching it.
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Produces measurement cycles from some transport.
///
/// A source is owned by exactly one reader thread; implementations never
/// need internal synchronization.
pub trait MeasurementSource: Send {
    /// Block for at most the source's internal timeout and return the next
    /// cycle, or `Ok(None)` when nothing arrived this round.
    fn poll_cycle(&mut self) -> Result<Option<MeasurementCycle>, SourceError>;
}

/// Consumes position fixes. Failures are reported per sink and must not
/// block delivery to other sinks.
pub trait PositionSink: Send {
    fn send_position(
        &mut self,
        position: &Position,
        timestamp_ms: Option<u64>,
    ) -> Result<(), SinkError>;
}

/// JSON payload written by the UDP and file sinks.
#[derive(Debug, Serialize)]
pub struct PositionRecord<'a> {
    pub position: &'a Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
}

/// Current unix time in milliseconds, for sink timestamps.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Handle to a reader thread pushing measurement cycles onto a bounded
/// channel.
///
/// Stopping is cooperative: the flag is observed at each poll boundary and
/// the thread is joined. Cycles that arrive while the channel is full are
/// dropped rather than blocking the reader past a stop request.
pub struct SourceReader {
    rx: Receiver<MeasurementCycle>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SourceReader {
    /// Spawn a named reader thread that drives `source` until stopped.
    pub fn spawn<S>(name: &str, mut source: S, channel_capacity: usize) -> io::Result<Self>
    where
        S: MeasurementSource + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(channel_capacity);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = thread::Builder::new()
            .name(format!("reader-{name}"))
            .spawn(move || {
                while !stop_flag.load(Ordering::Relaxed) {
                    match source.poll_cycle() {
                        Ok(Some(cycle)) => match tx.try_send(cycle) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                debug!("consumer lagging, dropping measurement cycle");
                            }
                            Err(TrySendError::Disconnected(_)) => break,
                        },
                        Ok(None) => {}
                        Err(err) => {
                            warn!("transport read failed: {err}");
                            thread::sleep(READ_RETRY_DELAY);
                        }
                    }
                }
            })?;

        Ok(Self {
            rx,
            stop,
            handle: Some(handle),
        })
    }

    /// Receive the next cycle, waiting up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<MeasurementCycle> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Signal the reader to stop and wait for it to exit.
    ///
    /// The wait is bounded: a reader stuck in a blocking transport read
    /// cannot observe the stop flag, so after [`JOIN_TIMEOUT`] the thread
    /// is reported and detached rather than hanging shutdown on it.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let Some(handle) = self.handle.take() else {
            return;
        };
        let deadline = Instant::now() + JOIN_TIMEOUT;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!("reader thread did not stop in time, detaching it");
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let _ = handle.join();
    }
}

impl Drop for SourceReader {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Source yielding a fixed list of cycles, then nothing.
    struct ScriptedSource {
        cycles: Vec<MeasurementCycle>,
    }

    impl MeasurementSource for ScriptedSource {
        fn poll_cycle(&mut self) -> Result<Option<MeasurementCycle>, SourceError> {
            if self.cycles.is_empty() {
                thread::sleep(Duration::from_millis(5));
                return Ok(None);
            }
            Ok(Some(self.cycles.remove(0)))
        }
    }

    #[test]
    fn test_reader_delivers_cycles_in_order() {
        let cycles = vec![
            HashMap::from([(1, 1.0)]),
            HashMap::from([(2, 2.0)]),
            HashMap::from([(3, 3.0)]),
        ];
        let mut reader = SourceReader::spawn(
            "test",
            ScriptedSource {
                cycles: cycles.clone(),
            },
            8,
        )
        .unwrap();

        for expected in &cycles {
            let got = reader
                .recv_timeout(Duration::from_secs(1))
                .expect("cycle not delivered");
            assert_eq!(&got, expected);
        }
        reader.stop();
        assert!(!reader.is_running());
    }

    #[test]
    fn test_stop_joins_reader() {
        let mut reader =
            SourceReader::spawn("idle", ScriptedSource { cycles: vec![] }, 4).unwrap();
        assert!(reader.is_running());
        reader.stop();
        assert!(!reader.is_running());
    }

    #[test]
    fn test_stop_returns_while_read_blocks() {
        // A source stuck in a blocking read never observes the stop flag;
        // stop must still return within its bounded wait instead of
        // hanging shutdown on the join.
        struct StuckSource;

        impl MeasurementSource for StuckSource {
            fn poll_cycle(&mut self) -> Result<Option<MeasurementCycle>, SourceError> {
                thread::sleep(Duration::from_secs(60));
                Ok(None)
            }
        }

        let mut reader = SourceReader::spawn("stuck", StuckSource, 4).unwrap();
        thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        reader.stop();
        assert!(started.elapsed() < JOIN_TIMEOUT + Duration::from_secs(1));
    }
}
