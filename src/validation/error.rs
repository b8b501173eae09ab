use thiserror::Error;

/// Fatal configuration faults, reported at engine construction or startup.
///
/// Unlike the per-cycle solver errors these must stop the application:
/// a misconfigured system would silently produce garbage fixes otherwise.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least 3 anchor positions are required, got {available}")]
    InsufficientAnchors { available: usize },

    #[error("{kind} calibration requires {expected} parameters, got {got}")]
    CalibrationArity {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("unknown calibration type: {kind:?}")]
    UnknownCalibration { kind: String },

    #[error("anchor id {key:?} is not a valid unsigned integer")]
    AnchorId { key: String },

    #[error("z_sign must be -1, 0 or +1, got {value}")]
    ZSign { value: i64 },

    #[error("invalid range bounds: min {min} > max {max}")]
    RangeBounds { min: f64, max: f64 },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Per-cycle position solve failures.
///
/// All of these are recoverable: the engine converts them into "no fix
/// produced" so the caller's measurement loop keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("not enough anchor positions for trilateration: {available} of 3")]
    InsufficientAnchors { available: usize },

    #[error("not enough distance samples for trilateration: {available} of 3")]
    InsufficientData { available: usize },

    #[error("not enough common anchors for trilateration: {matched} of 3")]
    NoCommonAnchors { matched: usize },

    #[error("degenerate anchor geometry: {details}")]
    Geometry { details: String },
}

/// A dequeued span that does not decode as a measurement frame.
///
/// The span was already removed from the ring, so a malformed frame never
/// corrupts buffer state; the caller drops it and keeps draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("malformed frame: expected 5 bytes, got {len}")]
    Malformed { len: usize },
}

/// Transport read-side faults.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid measurement payload: {details}")]
    Payload { details: String },
}

/// Position delivery faults. A failing sink is reported and skipped; it never
/// blocks delivery to the other sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode position: {0}")]
    Encode(#[from] serde_json::Error),
}
