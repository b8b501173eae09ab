//! Serial byte-stream measurement source
//!
//! Reads raw bytes from a ranging sensor, runs them through the stream
//! framer, and batches all frames observed in one drain into a single
//! measurement cycle. The device is any `Read` implementor: a serial device
//! node in production, an in-memory reader in tests. Line settings (baud,
//! parity) are expected to be configured on the device beforehand.
//!
//! The device is opened non-blocking so a silent sensor surfaces as an idle
//! poll instead of a read that never returns; the reader thread keeps
//! observing its stop flag between polls.

use crate::core::types::MeasurementCycle;
use crate::io::MeasurementSource;
use crate::processing::framing::FrameRing;
use crate::validation::error::SourceError;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Ring capacity for buffered candidate frames.
const DEFAULT_RING_CAPACITY: usize = 100;

/// Transport read buffer size.
const READ_BUF_SIZE: usize = 512;

/// Pause between polls when the stream yields no data, to avoid spinning.
const IDLE_DELAY: Duration = Duration::from_millis(10);

pub struct SerialSource<R: Read> {
    reader: R,
    ring: FrameRing,
    buf: Box<[u8; READ_BUF_SIZE]>,
}

impl SerialSource<File> {
    /// Open a serial device node in non-blocking mode, so reads return
    /// immediately when the device has no data.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut options = OpenOptions::new();
        options.read(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NONBLOCK);
        }
        Ok(Self::from_reader(options.open(path)?))
    }
}

impl<R: Read> SerialSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self::with_ring_capacity(reader, DEFAULT_RING_CAPACITY)
    }

    pub fn with_ring_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            ring: FrameRing::with_capacity(capacity),
            buf: Box::new([0u8; READ_BUF_SIZE]),
        }
    }
}

impl<R: Read + Send> MeasurementSource for SerialSource<R> {
    fn poll_cycle(&mut self) -> Result<Option<MeasurementCycle>, SourceError> {
        let n = match self.reader.read(&mut self.buf[..]) {
            Ok(n) => n,
            // Non-blocking device with nothing buffered yet
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                thread::sleep(IDLE_DELAY);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        if n == 0 {
            thread::sleep(IDLE_DELAY);
            return Ok(None);
        }
        self.ring.append(&self.buf[..n]);

        let cycle = self.ring.drain_cycle();
        if cycle.is_empty() {
            Ok(None)
        } else {
            Ok(Some(cycle))
        }
    }
}
