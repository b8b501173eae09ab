//! Stream framing for delimiter-separated measurement records
//!
//! The ranging sensor emits 5-byte records separated by a 4-byte delimiter,
//! chunked arbitrarily by the transport. `FrameRing` resynchronizes on the
//! delimiter and holds candidate spans in a bounded ring that overwrites the
//! oldest unread entry on overflow, so a stalled consumer sees recent data
//! rather than stale data.

use crate::core::types::MeasurementCycle;
use crate::validation::error::FrameError;
use tracing::{debug, warn};

/// Byte sequence separating measurement records on the wire.
pub const FRAME_DELIMITER: [u8; 4] = [0xFF, 0xFF, 0xFF, 0x00];

/// Wire size of one measurement record: u8 id + u32 distance, little-endian.
pub const FRAME_SIZE: usize = 5;

/// One fixed-layout measurement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub id: u8,
    pub distance_mm: u32,
}

impl Frame {
    /// Decode a dequeued span. Any length other than [`FRAME_SIZE`] is a
    /// malformed frame; the span is already out of the ring, so the caller
    /// just drops it and keeps draining.
    pub fn decode(span: &[u8]) -> Result<Self, FrameError> {
        if span.len() != FRAME_SIZE {
            return Err(FrameError::Malformed { len: span.len() });
        }
        Ok(Self {
            id: span[0],
            distance_mm: u32::from_le_bytes([span[1], span[2], span[3], span[4]]),
        })
    }

    /// Wire encoding, used by the write side and by tests.
    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut out = [0u8; FRAME_SIZE];
        out[0] = self.id;
        out[1..].copy_from_slice(&self.distance_mm.to_le_bytes());
        out
    }

    /// Measured distance converted to meters.
    pub fn distance_m(&self) -> f64 {
        self.distance_mm as f64 / 1000.0
    }
}

/// Bounded ring of candidate frame spans extracted from a byte stream.
///
/// Invariant: `size` equals the number of valid unconsumed slots. Writing
/// when the ring is full replaces the oldest unread span and advances the
/// tail, so the reader simply never sees the evicted entry.
#[derive(Debug)]
pub struct FrameRing {
    slots: Vec<Vec<u8>>,
    head: usize,
    tail: usize,
    size: usize,
}

impl FrameRing {
    /// Create a ring with `capacity` slots. Capacity must be nonzero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be nonzero");
        Self {
            slots: vec![Vec::new(); capacity],
            head: 0,
            tail: 0,
            size: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Split `chunk` on the frame delimiter and enqueue each candidate span.
    ///
    /// Empty spans (adjacent delimiters, chunk boundaries) are skipped.
    /// Oversized spans are silently discarded: a single corrupted read must
    /// not halt the stream. Undersized spans are kept and rejected at decode
    /// time instead, since the missing bytes may simply be garbage framing.
    pub fn append(&mut self, chunk: &[u8]) {
        for span in split_on_delimiter(chunk) {
            if span.is_empty() {
                continue;
            }
            if span.len() > FRAME_SIZE {
                debug!(len = span.len(), "discarding oversized span");
                continue;
            }
            self.push(span.to_vec());
        }
    }

    /// Dequeue the oldest unconsumed span.
    pub fn pop(&mut self) -> Option<Vec<u8>> {
        if self.size == 0 {
            return None;
        }
        let span = std::mem::take(&mut self.slots[self.tail]);
        self.tail = (self.tail + 1) % self.slots.len();
        self.size -= 1;
        Some(span)
    }

    /// Drain every queued span into one measurement cycle, keyed by anchor
    /// id with distances in meters. Later frames for the same id overwrite
    /// earlier ones within the drain; malformed spans are reported and
    /// dropped.
    pub fn drain_cycle(&mut self) -> MeasurementCycle {
        let mut cycle = MeasurementCycle::new();
        while let Some(span) = self.pop() {
            match Frame::decode(&span) {
                Ok(frame) => {
                    cycle.insert(frame.id, frame.distance_m());
                }
                Err(err) => warn!("dropping frame: {err}"),
            }
        }
        cycle
    }

    fn push(&mut self, span: Vec<u8>) {
        self.slots[self.head] = span;
        self.head = (self.head + 1) % self.slots.len();
        if self.size == self.slots.len() {
            // Full: the slot just written was the oldest unread entry.
            self.tail = (self.tail + 1) % self.slots.len();
        } else {
            self.size += 1;
        }
    }
}

/// Split a chunk on [`FRAME_DELIMITER`], returning every span between
/// delimiters including the (possibly empty) leading and trailing ones.
fn split_on_delimiter(chunk: &[u8]) -> Vec<&[u8]> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + FRAME_DELIMITER.len() <= chunk.len() {
        if chunk[i..i + FRAME_DELIMITER.len()] == FRAME_DELIMITER {
            spans.push(&chunk[start..i]);
            i += FRAME_DELIMITER.len();
            start = i;
        } else {
            i += 1;
        }
    }
    spans.push(&chunk[start..]);
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(frames: &[Frame]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for frame in frames {
            bytes.extend_from_slice(&frame.encode());
            bytes.extend_from_slice(&FRAME_DELIMITER);
        }
        bytes
    }

    #[test]
    fn test_frame_decode() {
        let frame = Frame::decode(&[7, 0xE8, 0x03, 0x00, 0x00]).unwrap();
        assert_eq!(frame.id, 7);
        assert_eq!(frame.distance_mm, 1000);
        assert_eq!(frame.distance_m(), 1.0);
    }

    #[test]
    fn test_frame_encode_little_endian() {
        let frame = Frame {
            id: 2,
            distance_mm: 0x0102_0304,
        };
        assert_eq!(frame.encode(), [2, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(Frame::decode(&frame.encode()).unwrap(), frame);
    }

    #[test]
    fn test_short_span_is_malformed() {
        assert_eq!(Frame::decode(b"123"), Err(FrameError::Malformed { len: 3 }));
        assert_eq!(Frame::decode(&[]), Err(FrameError::Malformed { len: 0 }));
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut ring = FrameRing::with_capacity(3);
        for item in [b"1", b"2", b"3", b"4"] {
            ring.push(item.to_vec());
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.pop().unwrap(), b"2");
        assert_eq!(ring.pop().unwrap(), b"3");
        assert_eq!(ring.pop().unwrap(), b"4");
        assert!(ring.pop().is_none());
    }

    #[test]
    fn test_single_chunk_yields_records_in_order() {
        let mut ring = FrameRing::with_capacity(8);
        let f1 = Frame {
            id: 1,
            distance_mm: 1500,
        };
        let f2 = Frame {
            id: 2,
            distance_mm: 2500,
        };
        ring.append(&framed(&[f1, f2]));

        assert_eq!(ring.len(), 2);
        assert_eq!(Frame::decode(&ring.pop().unwrap()).unwrap(), f1);
        assert_eq!(Frame::decode(&ring.pop().unwrap()).unwrap(), f2);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_adjacent_delimiters_drop_empty_spans() {
        let mut ring = FrameRing::with_capacity(8);
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&FRAME_DELIMITER);
        bytes.extend_from_slice(&FRAME_DELIMITER);
        bytes.extend_from_slice(&Frame { id: 3, distance_mm: 10 }.encode());
        bytes.extend_from_slice(&FRAME_DELIMITER);
        ring.append(&bytes);
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_oversized_span_is_discarded() {
        let mut ring = FrameRing::with_capacity(8);
        let mut bytes = vec![0u8; FRAME_SIZE + 3];
        bytes.extend_from_slice(&FRAME_DELIMITER);
        bytes.extend_from_slice(&Frame { id: 1, distance_mm: 42 }.encode());
        ring.append(&bytes);

        // Only the valid trailing record survives
        assert_eq!(ring.len(), 1);
        let frame = Frame::decode(&ring.pop().unwrap()).unwrap();
        assert_eq!(frame.distance_mm, 42);
    }

    #[test]
    fn test_malformed_span_does_not_affect_later_pops() {
        let mut ring = FrameRing::with_capacity(8);
        let mut bytes = b"xx".to_vec();
        bytes.extend_from_slice(&FRAME_DELIMITER);
        bytes.extend_from_slice(&Frame { id: 9, distance_mm: 900 }.encode());
        ring.append(&bytes);

        assert!(Frame::decode(&ring.pop().unwrap()).is_err());
        let frame = Frame::decode(&ring.pop().unwrap()).unwrap();
        assert_eq!(frame.id, 9);
    }

    #[test]
    fn test_drain_cycle_last_write_wins() {
        let mut ring = FrameRing::with_capacity(8);
        ring.append(&framed(&[
            Frame { id: 1, distance_mm: 1000 },
            Frame { id: 2, distance_mm: 2000 },
            Frame { id: 1, distance_mm: 3000 },
        ]));

        let cycle = ring.drain_cycle();
        assert_eq!(cycle.len(), 2);
        assert_eq!(cycle[&1], 3.0);
        assert_eq!(cycle[&2], 2.0);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_record_split_across_chunks_is_dropped() {
        // A frame torn across two appends produces two undersized spans;
        // both decode as malformed and the stream resynchronizes.
        let mut ring = FrameRing::with_capacity(8);
        let encoded = Frame { id: 5, distance_mm: 5000 }.encode();
        ring.append(&encoded[..2]);
        let mut rest = encoded[2..].to_vec();
        rest.extend_from_slice(&FRAME_DELIMITER);
        rest.extend_from_slice(&Frame { id: 6, distance_mm: 6000 }.encode());
        rest.extend_from_slice(&FRAME_DELIMITER);
        ring.append(&rest);

        let cycle = ring.drain_cycle();
        assert_eq!(cycle.len(), 1);
        assert_eq!(cycle[&6], 6.0);
    }
}
