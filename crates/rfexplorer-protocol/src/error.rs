//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when encoding commands or decoding frames.
///
/// Unknown inbound frame types are never an error; the decoder represents
/// them as [`crate::Packet::Unhandled`] so no byte range is silently dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A command parameter is outside its documented range. Rejected before
    /// any bytes are encoded.
    #[error("{name} out of range: {value} not in [{min}, {max}]")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Value supplied by the caller.
        value: i64,
        /// Minimum accepted value.
        min: i64,
        /// Maximum accepted value.
        max: i64,
    },

    /// Command payload exceeds what the length byte can represent.
    #[error("command too long: maximum {max} bytes, got {actual}")]
    CommandTooLong {
        /// Maximum allowed payload length.
        max: usize,
        /// Actual payload length.
        actual: usize,
    },

    /// Baud rate is not one of the nine documented values.
    #[error("unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// Frame is too short for its fixed layout.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length available.
        actual: usize,
    },
}
