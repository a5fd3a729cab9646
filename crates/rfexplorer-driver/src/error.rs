//! Driver error types.

use rfexplorer_protocol::ProtocolError;
use thiserror::Error;

/// Errors surfaced by the connection driver.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// A command could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The link closed before the initial configuration arrived.
    #[error("connection closed before the initial configuration arrived")]
    SetupFailed,

    /// No `#PCK` acknowledgment arrived within the allowed window after a
    /// preset write.
    #[error("timed out waiting for preset write acknowledgment")]
    AckTimeout,

    /// The read loop has exited and no further packets will arrive.
    #[error("connection closed")]
    ConnectionClosed,
}
