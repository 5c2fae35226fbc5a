// Error types for the ingest / walk / sync / decode pipeline

use thiserror::Error;

/// Errors that can occur while buffering, walking or decoding a file.
#[derive(Error, Debug)]
pub enum Error {
    /// The ingest buffer would grow past its configured capacity.
    #[error("Ingest capacity exceeded: {attempted} bytes requested, capacity is {capacity}")]
    CapacityExceeded { capacity: usize, attempted: usize },

    /// A box declared a size that does not fit the bytes around it.
    #[error("Malformed box '{box_type}' at offset {offset}: {reason}")]
    MalformedBox {
        offset: usize,
        box_type: String,
        reason: String,
    },

    /// No frame header at the candidate position.
    #[error("No sync pattern at offset {offset}")]
    NoSyncFound { offset: usize },

    /// A sync pattern was found but its frame length is implausible.
    #[error("Frame length {length} at offset {offset} is out of range")]
    FrameLengthOutOfRange { offset: usize, length: usize },

    /// The frame scan failed to advance past `offset`.
    #[error("Frame scan made no progress at offset {offset}")]
    NoProgress { offset: usize },

    /// A single frame could not be decoded.
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// Invalid session configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error ends the session instead of being skipped over.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::NoProgress { .. } | Error::CapacityExceeded { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_no_progress_and_capacity_are_fatal() {
        assert!(Error::NoProgress { offset: 4 }.is_fatal());
        assert!(Error::CapacityExceeded { capacity: 1, attempted: 2 }.is_fatal());
        assert!(!Error::NoSyncFound { offset: 0 }.is_fatal());
        assert!(!Error::FrameLengthOutOfRange { offset: 0, length: 3 }.is_fatal());
        assert!(!Error::DecodeFailure("short".into()).is_fatal());
        assert!(!Error::MalformedBox {
            offset: 0,
            box_type: "moov".into(),
            reason: "too big".into(),
        }
        .is_fatal());
    }
}
