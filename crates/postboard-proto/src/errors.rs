//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding wire payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Request body could not be serialized.
    #[error("failed to encode {what}: {reason}")]
    Encode {
        /// Payload being encoded
        what: &'static str,
        /// Serializer message
        reason: String,
    },

    /// Response body did not match the expected shape.
    #[error("failed to decode {what}: {reason}")]
    Decode {
        /// Payload being decoded
        what: &'static str,
        /// Deserializer message
        reason: String,
    },
}
