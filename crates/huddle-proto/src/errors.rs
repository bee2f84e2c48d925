//! Protocol error types.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Inbound frame was not a valid message object.
    #[error("malformed frame: {0}")]
    Decode(String),

    /// Outgoing frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(String),

    /// Timestamp string is neither RFC 3339 nor naive ISO-8601.
    #[error("invalid timestamp {0:?}")]
    Timestamp(String),

    /// Enumerated field holds a value outside the known set.
    #[error("unknown {kind} {value:?}")]
    UnknownValue {
        /// Field name, e.g. "status".
        kind: &'static str,
        /// Rejected input.
        value: String,
    },
}
