//! UDP measurement source and position sink
//!
//! The source accepts JSON datagrams in either of the shapes the sensors
//! emit: an id-to-distance object `{"1": 1.5}` or a record list
//! `[{"id": 1, "distance": 1.5}]`. The sink publishes each fix as a JSON
//! datagram.

use crate::core::types::{AnchorId, MeasurementCycle, Position};
use crate::io::{MeasurementSource, PositionRecord, PositionSink};
use crate::validation::error::{SinkError, SourceError};
use serde_json::Value;
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::time::Duration;
use tracing::{info, warn};

/// Receive timeout; bounds how long a poll blocks so stop requests are
/// observed promptly.
const RECV_TIMEOUT: Duration = Duration::from_secs(1);

const DATAGRAM_BUF_SIZE: usize = 2048;

pub struct UdpSource {
    socket: UdpSocket,
    buf: Box<[u8; DATAGRAM_BUF_SIZE]>,
}

impl UdpSource {
    /// Bind a listening socket for measurement datagrams.
    pub fn bind(host: &str, port: u16) -> std::io::Result<Self> {
        let socket = UdpSocket::bind((host, port))?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        info!(host, port, "UDP measurement source listening");
        Ok(Self {
            socket,
            buf: Box::new([0u8; DATAGRAM_BUF_SIZE]),
        })
    }
}

impl MeasurementSource for UdpSource {
    fn poll_cycle(&mut self) -> Result<Option<MeasurementCycle>, SourceError> {
        match self.socket.recv_from(&mut self.buf[..]) {
            Ok((n, _addr)) => match parse_cycle_payload(&self.buf[..n]) {
                Ok(cycle) => Ok(Some(cycle)),
                Err(err) => {
                    // One bad datagram must not stop the stream
                    warn!("skipping measurement datagram: {err}");
                    Ok(None)
                }
            },
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Parse a measurement payload in either accepted JSON shape.
pub(crate) fn parse_cycle_payload(data: &[u8]) -> Result<MeasurementCycle, SourceError> {
    let value: Value = serde_json::from_slice(data).map_err(|err| SourceError::Payload {
        details: err.to_string(),
    })?;

    let mut cycle = MeasurementCycle::new();
    match value {
        Value::Object(entries) => {
            for (key, value) in entries {
                let id: AnchorId = key.parse().map_err(|_| SourceError::Payload {
                    details: format!("invalid anchor id key {key:?}"),
                })?;
                let distance = value.as_f64().ok_or_else(|| SourceError::Payload {
                    details: format!("non-numeric distance for anchor {id}"),
                })?;
                cycle.insert(id, distance);
            }
        }
        Value::Array(items) => {
            for item in items {
                let id = item
                    .get("id")
                    .and_then(Value::as_u64)
                    .and_then(|id| AnchorId::try_from(id).ok())
                    .ok_or_else(|| SourceError::Payload {
                        details: "record is missing a valid \"id\"".to_string(),
                    })?;
                let distance = item
                    .get("distance")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| SourceError::Payload {
                        details: format!("record for anchor {id} is missing \"distance\""),
                    })?;
                cycle.insert(id, distance);
            }
        }
        other => {
            return Err(SourceError::Payload {
                details: format!("expected object or array, got {other}"),
            })
        }
    }
    Ok(cycle)
}

/// Publishes fixes as JSON datagrams to a fixed target.
pub struct UdpSink {
    socket: UdpSocket,
    target: (String, u16),
}

impl UdpSink {
    pub fn connect(host: &str, port: u16) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        info!(host, port, "UDP position sink initialized");
        Ok(Self {
            socket,
            target: (host.to_string(), port),
        })
    }
}

impl PositionSink for UdpSink {
    fn send_position(
        &mut self,
        position: &Position,
        timestamp_ms: Option<u64>,
    ) -> Result<(), SinkError> {
        let payload = serde_json::to_vec(&PositionRecord {
            position,
            timestamp_ms,
        })?;
        self.socket
            .send_to(&payload, (self.target.0.as_str(), self.target.1))?;
        Ok(())
    }
}
