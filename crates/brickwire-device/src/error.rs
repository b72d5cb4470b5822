use brickwire_codec::{CodecError, ValidationError};
use brickwire_transport::TransportError;

use crate::bytecodes::system::status_name;

/// Errors that can occur in device operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Command encoding or reply decoding failed outside a transport call.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Arguments were rejected before any bytes were built.
    #[error("invalid argument: {0}")]
    Validation(#[from] ValidationError),

    /// A system command completed with a non-success status.
    #[error("system command 0x{opcode:02X} failed: {} (0x{status:02X})", status_name(*.status))]
    SystemStatus { opcode: u8, status: u8 },

    /// The reply decoded but did not carry the expected value.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    /// The polling thread panicked.
    #[error("poller thread panicked")]
    PollerPanicked,
}

pub type Result<T> = std::result::Result<T, DeviceError>;
