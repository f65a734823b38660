//! Error types for codec operations.

use thiserror::Error;

/// Errors returned by codec operations.
///
/// Every error is local to the call that produced it: nothing is retried
/// internally and no partial output is returned.
#[derive(Debug, Error)]
pub enum CodecError {
    /// PCM input does not have the exact per-frame byte length.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// Packet failed structural validation (header, length, layout).
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// The encoder could not fit a frame into the maximum packet size.
    #[error("bit budget exceeded: need {needed} bits, limit is {limit}")]
    BitBudgetExceeded { needed: usize, limit: usize },

    /// Unexpected failure while dequantizing or inverse transforming.
    #[error("decode error: {0}")]
    Decode(String),

    /// Codec configuration was rejected at construction.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl CodecError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        CodecError::MalformedPacket(reason.into())
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        CodecError::Decode(reason.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodecError>;
